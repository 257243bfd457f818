//! # opencheque-ledger
//!
//! **Record Plane**: cheque and account storage traits, their in-memory
//! implementations, and the per-cheque lock registry.
//!
//! ## Architecture
//!
//! 1. [`ChequeStore`] holds cheque records; every status write goes
//!    through its compare-and-set [`transition`](ChequeStore::transition)
//! 2. [`AccountStore`] holds balances; its atomic
//!    [`transfer`](AccountStore::transfer) re-checks funds under the lock
//!    that debits them
//! 3. [`ChequeLocks`] hands out one mutex per cheque id so settle, split,
//!    and the expiry sweep serialize their writes to the same cheque
//!
//! The in-memory implementations are the only ones shipped. A durable
//! backend slots in behind the same traits.

pub mod account_store;
pub mod cheque_store;
pub mod locks;

pub use account_store::{AccountStore, MemoryAccountStore};
pub use cheque_store::{ChequeStore, MemoryChequeStore};
pub use locks::ChequeLocks;
