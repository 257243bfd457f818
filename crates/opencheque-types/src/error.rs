//! Error types for the OpenCheque engine.
//!
//! All errors use the `OC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Lookup errors
//! - 2xx: Validation errors
//! - 3xx: State / authorization errors
//! - 4xx: Cryptographic errors
//! - 9xx: General / internal errors
//!
//! Lookup and validation errors are client-caused and not retryable; state
//! and authorization errors are final (retrying cannot change the outcome);
//! cryptographic errors indicate tampering or corruption and are never
//! reduced to a bare boolean; 9xx infrastructure errors are the only group a
//! caller may retry with backoff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ChequeId, ChequeStatus};

/// Central error enum for all OpenCheque operations.
#[derive(Debug, Error)]
pub enum ChequeError {
    // =================================================================
    // Lookup Errors (1xx)
    // =================================================================
    /// No account exists with the given username.
    #[error("OC_ERR_100: Account not found: {username}")]
    AccountNotFound { username: String },

    /// No cheque exists with the given id.
    #[error("OC_ERR_101: Cheque not found: {0}")]
    ChequeNotFound(ChequeId),

    // =================================================================
    // Validation Errors (2xx)
    // =================================================================
    /// The payee realname in the request does not match the account record.
    #[error("OC_ERR_200: Payee realname does not match account: {username}")]
    RealnameMismatch { username: String },

    /// The payer's balance cannot cover the amount.
    #[error("OC_ERR_201: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// The requested expiry date is not in the future.
    #[error("OC_ERR_202: Expiry is not in the future: {expiry}")]
    InvalidExpiry { expiry: DateTime<Utc> },

    /// Split amounts do not sum to the parent amount exactly.
    #[error("OC_ERR_203: Split amounts must sum to parent amount: expected {expected}, got {provided}")]
    AmountMismatch { expected: Decimal, provided: Decimal },

    /// The operation is structurally invalid (split of a child, empty
    /// split, non-positive amount, duplicate account, ...).
    #[error("OC_ERR_204: Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    // =================================================================
    // State / Authorization Errors (3xx)
    // =================================================================
    /// The cheque is not in the status the operation requires.
    #[error("OC_ERR_300: Cheque is not in ISSUED status: {current}")]
    InvalidState { current: ChequeStatus },

    /// The cheque's expiry date has passed.
    #[error("OC_ERR_301: Cheque has expired: {0}")]
    ChequeExpired(ChequeId),

    /// The requester is not the payee named on the cheque.
    #[error("OC_ERR_302: Requester is not the named payee: {requester}")]
    Unauthorized { requester: String },

    /// The cheque's nonce was already consumed by a settlement.
    #[error("OC_ERR_303: Nonce already consumed: {nonce}")]
    ReplayDetected { nonce: String },

    // =================================================================
    // Cryptographic Errors (4xx)
    // =================================================================
    /// The claim signature did not verify against the issuer public key.
    #[error("OC_ERR_400: Claim signature verification failed")]
    SignatureInvalid,

    /// Key unwrap or payload decryption failed (bad padding, tag
    /// mismatch, malformed base64).
    #[error("OC_ERR_401: Envelope decryption failed")]
    DecryptionFailure,

    /// A cryptographic step failed while sealing (key generation,
    /// encryption, wrapping, or signing).
    #[error("OC_ERR_402: Cryptographic operation failed: {reason}")]
    CryptoFailure { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// A collaborator (store, key service) is unavailable.
    #[error("OC_ERR_900: Service unavailable: {reason}")]
    Unavailable { reason: String },

    /// Serialization / deserialization error.
    #[error("OC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk, network).
    #[error("OC_ERR_902: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ChequeError>;

// Conversion from std::io::Error
impl From<std::io::Error> for ChequeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = ChequeError::ChequeNotFound(ChequeId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("OC_ERR_101"), "Got: {msg}");
    }

    #[test]
    fn insufficient_funds_display() {
        let err = ChequeError::InsufficientFunds {
            needed: Decimal::new(2000, 0),
            available: Decimal::new(500, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_201"));
        assert!(msg.contains("2000"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn invalid_state_display() {
        let err = ChequeError::InvalidState {
            current: ChequeStatus::Cleared,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_300"));
        assert!(msg.contains("CLEARED"));
    }

    #[test]
    fn all_errors_have_oc_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(ChequeError::AccountNotFound {
                username: "alice".into(),
            }),
            Box::new(ChequeError::SignatureInvalid),
            Box::new(ChequeError::DecryptionFailure),
            Box::new(ChequeError::ReplayDetected {
                nonce: "deadbeef".into(),
            }),
            Box::new(ChequeError::Io("disk".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OC_ERR_"),
                "Error missing OC_ERR_ prefix: {msg}"
            );
        }
    }
}
