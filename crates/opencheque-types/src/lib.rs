//! # opencheque-types
//!
//! Shared types, errors, and constants for the **OpenCheque** engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ChequeId`], [`AccountId`]
//! - **Account model**: [`Account`]
//! - **Claim model**: [`CanonicalClaim`], [`Nonce`]
//! - **Cheque model**: [`Cheque`], [`ChequeStatus`]
//! - **Public views**: [`ChequeView`], [`ChequeRequest`], [`TransferPayload`]
//! - **Errors**: [`ChequeError`] with `OC_ERR_` prefix codes
//! - **Constants**: key sizes and protocol defaults

pub mod account;
pub mod cheque;
pub mod claim;
pub mod constants;
pub mod error;
pub mod ids;
pub mod view;

// Re-export all primary types at crate root for ergonomic imports:
//   use opencheque_types::{Cheque, ChequeStatus, ChequeError, ...};

pub use account::*;
pub use cheque::*;
pub use claim::*;
pub use error::*;
pub use ids::*;
pub use view::*;

// Constants are accessed via `opencheque_types::constants::FOO`
// (not re-exported to avoid name collisions).
