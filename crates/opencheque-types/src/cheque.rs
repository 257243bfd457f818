//! # Cheque: the signed, encrypted claim against an account balance
//!
//! A `Cheque` carries a sealed envelope (encrypted payload, wrapped key,
//! signature, nonce) plus the plaintext record fields the ledger indexes on.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐   settle    ┌─────────┐
//!   │ ISSUED ├────────────▶│ CLEARED │
//!   └─┬────┬─┘             └─────────┘
//!     │    │  sweep        ┌─────────┐
//!     │    └──────────────▶│ EXPIRED │
//!     │  split             └─────────┘
//!     ▼
//!   ┌───────┐
//!   │ SPLIT │
//!   └───────┘
//! ```
//!
//! Transitions are **monotonic**: there is no way out of SPLIT, CLEARED,
//! or EXPIRED. Exactly one settlement can ever observe the ISSUED → CLEARED
//! transition, so a cheque cannot be double-spent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CanonicalClaim, ChequeId, Nonce};

/// The lifecycle status of a cheque.
///
/// Transitions are monotonic (never go backwards):
/// - `Issued → Cleared` (settlement moved the funds)
/// - `Issued → Split` (the cheque was divided into children)
/// - `Issued → Expired` (the sweep retired it past its expiry date)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChequeStatus {
    /// Live and redeemable by the named payee.
    Issued,
    /// Divided into child cheques; the parent itself can no longer settle.
    Split,
    /// Settlement moved the funds. **Irreversible.**
    Cleared,
    /// Retired by the expiry sweep without ever settling.
    Expired,
}

impl ChequeStatus {
    /// Can this status transition to the given target status?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Issued, Self::Split | Self::Cleared | Self::Expired)
        )
    }
}

impl std::fmt::Display for ChequeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issued => write!(f, "ISSUED"),
            Self::Split => write!(f, "SPLIT"),
            Self::Cleared => write!(f, "CLEARED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A digital cheque: a signed, encrypted claim against the payer's balance.
///
/// The realname fields are snapshots taken at issuance; they do not change
/// if the account's realname is later edited (non-repudiation of what was
/// agreed when the cheque was written).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cheque {
    /// Globally unique cheque identifier.
    pub id: ChequeId,
    /// Amount promised, strictly positive.
    pub amount: Decimal,
    /// Username of the account to debit.
    pub payer_username: String,
    /// Payer realname snapshot at issuance.
    pub payer_realname: String,
    /// Username of the account to credit.
    pub payee_username: String,
    /// Payee realname snapshot at issuance.
    pub payee_realname: String,
    /// When the cheque was issued.
    pub issue_date: DateTime<Utc>,
    /// Instant after which the cheque can no longer settle.
    pub expiry_date: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: ChequeStatus,
    /// Set only on a child produced by a split; a child is never split again.
    pub parent_cheque_id: Option<ChequeId>,
    /// Single-use anti-replay token, unique process-wide.
    pub nonce: Nonce,
    /// Signature over the plaintext canonical claim.
    pub signature: Vec<u8>,
    /// The claim, symmetric-encrypted: base64 over `IV || ciphertext`.
    pub encrypted_payload: String,
    /// The symmetric key, asymmetric-encrypted for the holder of the
    /// process private key. Never exposed through public views.
    pub wrapped_key: Vec<u8>,
}

impl Cheque {
    /// Reconstruct the claim this cheque's record fields assert.
    ///
    /// Verification compares this against the claim recovered from the
    /// envelope; any disagreement means the record was tampered with.
    #[must_use]
    pub fn claim(&self) -> CanonicalClaim {
        CanonicalClaim {
            amount: self.amount,
            payer: self.payer_username.clone(),
            payee: self.payee_username.clone(),
            expiry: self.expiry_date,
            nonce: self.nonce,
        }
    }

    /// Returns `true` if this cheque's expiry date has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry_date
    }

    /// Attempt to transition to CLEARED.
    ///
    /// # Errors
    /// Returns [`crate::ChequeError::InvalidState`] unless the current
    /// status is ISSUED.
    pub fn mark_cleared(&mut self) -> crate::Result<()> {
        self.transition_to(ChequeStatus::Cleared)
    }

    /// Attempt to transition to SPLIT.
    ///
    /// # Errors
    /// Returns [`crate::ChequeError::InvalidState`] unless the current
    /// status is ISSUED.
    pub fn mark_split(&mut self) -> crate::Result<()> {
        self.transition_to(ChequeStatus::Split)
    }

    /// Attempt to transition to EXPIRED.
    ///
    /// # Errors
    /// Returns [`crate::ChequeError::InvalidState`] unless the current
    /// status is ISSUED.
    pub fn mark_expired(&mut self) -> crate::Result<()> {
        self.transition_to(ChequeStatus::Expired)
    }

    fn transition_to(&mut self, target: ChequeStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(crate::ChequeError::InvalidState {
                current: self.status,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Dummy cheque for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Cheque {
    /// Create a dummy ISSUED cheque with placeholder envelope artifacts.
    pub fn dummy(payer: &str, payee: &str, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: ChequeId::new(),
            amount,
            payer_username: payer.to_string(),
            payer_realname: format!("{payer} realname"),
            payee_username: payee.to_string(),
            payee_realname: format!("{payee} realname"),
            issue_date: now,
            expiry_date: now + chrono::Duration::hours(24),
            status: ChequeStatus::Issued,
            parent_cheque_id: None,
            nonce: Nonce::from_bytes(rand::random::<[u8; 16]>()),
            signature: vec![0u8; 256],
            encrypted_payload: String::new(),
            wrapped_key: vec![0u8; 256],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cheque() -> Cheque {
        Cheque::dummy("alice", "bob", Decimal::new(2000, 0))
    }

    #[test]
    fn status_transitions_valid() {
        assert!(ChequeStatus::Issued.can_transition_to(ChequeStatus::Split));
        assert!(ChequeStatus::Issued.can_transition_to(ChequeStatus::Cleared));
        assert!(ChequeStatus::Issued.can_transition_to(ChequeStatus::Expired));
    }

    #[test]
    fn status_transitions_invalid() {
        for terminal in [
            ChequeStatus::Split,
            ChequeStatus::Cleared,
            ChequeStatus::Expired,
        ] {
            assert!(!terminal.can_transition_to(ChequeStatus::Issued));
            assert!(!terminal.can_transition_to(ChequeStatus::Split));
            assert!(!terminal.can_transition_to(ChequeStatus::Cleared));
            assert!(!terminal.can_transition_to(ChequeStatus::Expired));
        }
    }

    #[test]
    fn status_display_screaming_case() {
        assert_eq!(format!("{}", ChequeStatus::Issued), "ISSUED");
        assert_eq!(format!("{}", ChequeStatus::Split), "SPLIT");
        assert_eq!(format!("{}", ChequeStatus::Cleared), "CLEARED");
        assert_eq!(format!("{}", ChequeStatus::Expired), "EXPIRED");
    }

    #[test]
    fn mark_cleared_from_issued() {
        let mut cheque = make_cheque();
        assert!(cheque.mark_cleared().is_ok());
        assert_eq!(cheque.status, ChequeStatus::Cleared);
    }

    #[test]
    fn double_clear_blocked() {
        let mut cheque = make_cheque();
        cheque.mark_cleared().unwrap();
        assert!(cheque.mark_cleared().is_err(), "CLEARED → CLEARED must fail");
    }

    #[test]
    fn split_cheque_cannot_clear() {
        let mut cheque = make_cheque();
        cheque.mark_split().unwrap();
        let err = cheque.mark_cleared().unwrap_err();
        assert!(matches!(
            err,
            crate::ChequeError::InvalidState {
                current: ChequeStatus::Split
            }
        ));
    }

    #[test]
    fn expired_cheque_cannot_clear() {
        let mut cheque = make_cheque();
        cheque.mark_expired().unwrap();
        assert!(cheque.mark_cleared().is_err());
    }

    #[test]
    fn claim_mirrors_record_fields() {
        let cheque = make_cheque();
        let claim = cheque.claim();
        assert_eq!(claim.amount, cheque.amount);
        assert_eq!(claim.payer, cheque.payer_username);
        assert_eq!(claim.payee, cheque.payee_username);
        assert_eq!(claim.expiry, cheque.expiry_date);
        assert_eq!(claim.nonce, cheque.nonce);
    }

    #[test]
    fn fresh_cheque_not_expired() {
        let cheque = make_cheque();
        assert!(!cheque.is_expired());
    }

    #[test]
    fn past_expiry_detected() {
        let mut cheque = make_cheque();
        cheque.expiry_date = Utc::now() - chrono::Duration::hours(1);
        assert!(cheque.is_expired());
    }

    #[test]
    fn serde_roundtrip() {
        let cheque = make_cheque();
        let json = serde_json::to_string(&cheque).unwrap();
        let back: Cheque = serde_json::from_str(&json).unwrap();
        assert_eq!(cheque.id, back.id);
        assert_eq!(cheque.amount, back.amount);
        assert_eq!(cheque.status, back.status);
        assert_eq!(cheque.nonce, back.nonce);
    }
}
