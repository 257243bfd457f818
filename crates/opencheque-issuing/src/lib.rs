//! # opencheque-issuing
//!
//! **Issuance Plane**: turning a payer's request into a sealed, persisted
//! cheque, and splitting outstanding cheques into smaller ones.
//!
//! ## Architecture
//!
//! The [`ChequeIssuer`] validates a request against the account ledger,
//! has the Sealing Plane produce the envelope artifacts, and persists the
//! record:
//! 1. Resolve payer and payee; bind the cheque to the payee's realname
//! 2. Check coverage (point-in-time; settlement re-checks)
//! 3. Check expiry and amount
//! 4. Seal the claim and persist the ISSUED record
//!
//! Splitting replaces one ISSUED cheque with children whose amounts sum
//! exactly to the parent's, committed atomically with the parent's flip
//! to SPLIT.

pub mod issuer;

pub use issuer::ChequeIssuer;
