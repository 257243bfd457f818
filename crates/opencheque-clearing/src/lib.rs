//! # opencheque-clearing
//!
//! **Clearing Plane**: cheque verification, exactly-once settlement, and
//! the expiry sweep.
//!
//! ## Architecture
//!
//! The [`ClearingEngine`] runs every check the Sealing Plane makes
//! possible before it moves money:
//! 1. Status gate (only ISSUED cheques clear)
//! 2. Expiry gate
//! 3. Requester gate (only the named payee may verify or settle)
//! 4. Envelope open (unwrap key, decrypt, signature check)
//! 5. Claim/record agreement (tamper detection)
//! 6. Replay gate against the nonce registry
//!
//! Settlement then reserves the nonce, transfers funds, and flips the
//! record ISSUED → CLEARED under the cheque's write lock, rolling back on
//! any failure so no partial settlement survives.

pub mod engine;

pub use engine::ClearingEngine;
