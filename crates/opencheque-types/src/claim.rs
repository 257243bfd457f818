//! The canonical claim: the plaintext statement a cheque commits to.
//!
//! A claim binds amount, payer, payee, expiry, and a single-use nonce.
//! The envelope encrypts the claim's JSON serialization and signs its
//! canonical byte form; both are derived from the same struct so the
//! signature covers exactly what the payload decrypts to.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::NONCE_LEN;

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// A single-use random token binding one claim instance.
///
/// Nonces are generated at seal time and consumed exactly once at
/// settlement. Displayed as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce(pub [u8; NONCE_LEN]);

impl Nonce {
    #[must_use]
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// CanonicalClaim
// ---------------------------------------------------------------------------

/// The plaintext structured statement a cheque cryptographically commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalClaim {
    /// Amount promised, exact decimal.
    pub amount: Decimal,
    /// Username of the account being debited.
    pub payer: String,
    /// Username of the account being credited.
    pub payee: String,
    /// Instant after which the claim is worthless.
    pub expiry: DateTime<Utc>,
    /// Single-use anti-replay token.
    pub nonce: Nonce,
}

impl CanonicalClaim {
    /// Canonical byte form for signing and verification.
    ///
    /// Format: `"opencheque:claim:v1:"` followed by every variable-length
    /// field as `len_u64_le || bytes`, then the fixed-length nonce. Length
    /// framing keeps adjacent string fields from aliasing each other.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(160);
        payload.extend_from_slice(b"opencheque:claim:v1:");
        push_field(&mut payload, self.amount.to_string().as_bytes());
        push_field(&mut payload, self.payer.as_bytes());
        push_field(&mut payload, self.payee.as_bytes());
        push_field(&mut payload, self.expiry.to_rfc3339().as_bytes());
        payload.extend_from_slice(self.nonce.as_bytes());
        payload
    }
}

fn push_field(payload: &mut Vec<u8>, field: &[u8]) {
    payload.extend_from_slice(&(field.len() as u64).to_le_bytes());
    payload.extend_from_slice(field);
}
