//! Public projections of cheque data for the request-handling layer.
//!
//! [`ChequeView`] and [`TransferPayload`] may expose the encrypted payload,
//! signature, and nonce; those are safe to hand to transports (QR codes,
//! peer-to-peer messages). The wrapped key and raw symmetric material never
//! leave the trust boundary and are absent from every view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Cheque, ChequeId, ChequeStatus, Nonce};

/// Issuance request, as received from the request-handling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChequeRequest {
    /// Amount to promise, strictly positive.
    pub amount: Decimal,
    /// Username of the account to credit.
    pub payee_username: String,
    /// Expected realname of the payee; must match the account record.
    pub payee_realname: String,
    /// Requested expiry instant, must be in the future.
    pub expiry: DateTime<Utc>,
}

/// The public view of a cheque. Excludes the wrapped key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChequeView {
    pub id: ChequeId,
    pub amount: Decimal,
    pub payer_username: String,
    pub payer_realname: String,
    pub payee_username: String,
    pub payee_realname: String,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: ChequeStatus,
    pub parent_cheque_id: Option<ChequeId>,
    pub nonce: Nonce,
    pub signature: Vec<u8>,
    pub encrypted_payload: String,
}

impl From<&Cheque> for ChequeView {
    fn from(cheque: &Cheque) -> Self {
        Self {
            id: cheque.id,
            amount: cheque.amount,
            payer_username: cheque.payer_username.clone(),
            payer_realname: cheque.payer_realname.clone(),
            payee_username: cheque.payee_username.clone(),
            payee_realname: cheque.payee_realname.clone(),
            issue_date: cheque.issue_date,
            expiry_date: cheque.expiry_date,
            status: cheque.status,
            parent_cheque_id: cheque.parent_cheque_id,
            nonce: cheque.nonce,
            signature: cheque.signature.clone(),
            encrypted_payload: cheque.encrypted_payload.clone(),
        }
    }
}

/// Hand-off bundle for peer-to-peer or QR transport of a cheque.
///
/// Carries everything the receiving side needs to present the cheque for
/// verification. The wrapped key stays behind: only the clearing side can
/// open the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferPayload {
    pub cheque_id: ChequeId,
    pub encrypted_payload: String,
    pub signature: Vec<u8>,
    pub nonce: Nonce,
}

impl From<&Cheque> for TransferPayload {
    fn from(cheque: &Cheque) -> Self {
        Self {
            cheque_id: cheque.id,
            encrypted_payload: cheque.encrypted_payload.clone(),
            signature: cheque.signature.clone(),
            nonce: cheque.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_mirrors_cheque_fields() {
        let cheque = Cheque::dummy("alice", "bob", Decimal::new(2000, 0));
        let view = ChequeView::from(&cheque);
        assert_eq!(view.id, cheque.id);
        assert_eq!(view.amount, cheque.amount);
        assert_eq!(view.status, cheque.status);
        assert_eq!(view.nonce, cheque.nonce);
        assert_eq!(view.encrypted_payload, cheque.encrypted_payload);
    }

    #[test]
    fn view_never_serializes_wrapped_key() {
        let mut cheque = Cheque::dummy("alice", "bob", Decimal::new(100, 0));
        cheque.wrapped_key = vec![0xAA; 256];
        let json = serde_json::to_string(&ChequeView::from(&cheque)).unwrap();
        assert!(!json.contains("wrapped_key"), "Got: {json}");
    }

    #[test]
    fn transfer_payload_excludes_wrapped_key() {
        let cheque = Cheque::dummy("alice", "bob", Decimal::new(100, 0));
        let payload = TransferPayload::from(&cheque);
        assert_eq!(payload.cheque_id, cheque.id);
        assert_eq!(payload.nonce, cheque.nonce);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("wrapped_key"));
    }

    #[test]
    fn request_serde_roundtrip() {
        let request = ChequeRequest {
            amount: Decimal::new(2000, 0),
            payee_username: "bob".to_string(),
            payee_realname: "Bob Brandt".to_string(),
            expiry: Utc::now() + chrono::Duration::days(7),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: ChequeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.amount, back.amount);
        assert_eq!(request.payee_username, back.payee_username);
    }
}
