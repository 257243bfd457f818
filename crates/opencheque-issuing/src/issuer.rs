//! Cheque issuance and splitting.
//!
//! Issuance never moves money. A cheque is a sealed promise against the
//! payer's balance; funds stay put until the clearing engine settles it.
//! The funds check here is a point-in-time courtesy that stops obviously
//! uncovered cheques at the door, and it is repeated at settlement.

use std::sync::{Arc, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use opencheque_crypto::CryptoEnvelope;
use opencheque_ledger::{AccountStore, ChequeLocks, ChequeStore};
use opencheque_types::{
    Cheque, ChequeError, ChequeId, ChequeRequest, ChequeStatus, ChequeView, Result,
};

/// Issues new cheques and splits outstanding ones.
///
/// All entry points take `&self`; shared state lives in the injected
/// stores.
pub struct ChequeIssuer {
    envelope: Arc<CryptoEnvelope>,
    cheques: Arc<dyn ChequeStore>,
    accounts: Arc<dyn AccountStore>,
    locks: Arc<ChequeLocks>,
}

impl ChequeIssuer {
    #[must_use]
    pub fn new(
        envelope: Arc<CryptoEnvelope>,
        cheques: Arc<dyn ChequeStore>,
        accounts: Arc<dyn AccountStore>,
        locks: Arc<ChequeLocks>,
    ) -> Self {
        Self {
            envelope,
            cheques,
            accounts,
            locks,
        }
    }

    /// Issue a new cheque from `payer_username` per `request`.
    ///
    /// Validates accounts, payee identity, coverage, expiry, and amount
    /// before any cryptography runs. The realname comparison binds the
    /// cheque to a human-verified identity, not just a username.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `RealnameMismatch`, `InsufficientFunds`,
    /// `InvalidExpiry`, `InvalidOperation` (non-positive amount), or
    /// `CryptoFailure` from sealing.
    pub fn issue(&self, payer_username: &str, request: &ChequeRequest) -> Result<ChequeView> {
        let payer = self.accounts.fetch(payer_username)?;
        let payee = self.accounts.fetch(&request.payee_username)?;

        if payee.realname != request.payee_realname {
            return Err(ChequeError::RealnameMismatch {
                username: payee.username,
            });
        }
        if !payer.can_cover(request.amount) {
            return Err(ChequeError::InsufficientFunds {
                needed: request.amount,
                available: payer.balance,
            });
        }
        let now = Utc::now();
        if request.expiry <= now {
            return Err(ChequeError::InvalidExpiry {
                expiry: request.expiry,
            });
        }
        if request.amount <= Decimal::ZERO {
            return Err(ChequeError::InvalidOperation {
                reason: format!("cheque amount must be positive, got {}", request.amount),
            });
        }

        let sealed = self.envelope.seal(
            request.amount,
            &payer.username,
            &payee.username,
            request.expiry,
        )?;

        let cheque = Cheque {
            id: ChequeId::new(),
            amount: request.amount,
            payer_username: payer.username,
            payer_realname: payer.realname,
            payee_username: payee.username,
            payee_realname: payee.realname,
            issue_date: now,
            expiry_date: request.expiry,
            status: ChequeStatus::Issued,
            parent_cheque_id: None,
            nonce: sealed.nonce,
            signature: sealed.signature,
            encrypted_payload: sealed.encrypted_payload,
            wrapped_key: sealed.wrapped_key,
        };

        self.cheques.insert(cheque.clone())?;

        tracing::info!(
            cheque = %cheque.id,
            payer = %cheque.payer_username,
            payee = %cheque.payee_username,
            amount = %cheque.amount,
            "Cheque issued"
        );

        Ok(ChequeView::from(&cheque))
    }

    /// Split an ISSUED cheque into children whose amounts sum exactly to
    /// the parent's.
    ///
    /// Each child gets a fresh claim (fresh nonce, fresh signature)
    /// carrying the parent's payer and payee, and references the parent.
    /// Children and the parent's ISSUED -> SPLIT flip are committed as one
    /// atomic store step; a failure anywhere persists nothing.
    ///
    /// # Errors
    ///
    /// `ChequeNotFound`, `InvalidOperation` (child cheque, non-ISSUED
    /// status, empty or non-positive amounts), `AmountMismatch` (sum does
    /// not equal the parent amount exactly), or `CryptoFailure` from
    /// sealing.
    pub fn split(&self, cheque_id: ChequeId, amounts: &[Decimal]) -> Result<Vec<ChequeView>> {
        let lock = self.locks.lock_for(cheque_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let parent = self.cheques.fetch(cheque_id)?;

        if parent.parent_cheque_id.is_some() {
            return Err(ChequeError::InvalidOperation {
                reason: "cheque is itself a split child and cannot be split again".to_string(),
            });
        }
        if parent.status != ChequeStatus::Issued {
            return Err(ChequeError::InvalidOperation {
                reason: format!("cheque is not splittable in status {}", parent.status),
            });
        }
        if amounts.is_empty() {
            return Err(ChequeError::InvalidOperation {
                reason: "split requires at least one amount".to_string(),
            });
        }
        if let Some(bad) = amounts.iter().find(|amount| **amount <= Decimal::ZERO) {
            return Err(ChequeError::InvalidOperation {
                reason: format!("split amounts must be positive, got {bad}"),
            });
        }
        let total: Decimal = amounts.iter().sum();
        if total != parent.amount {
            return Err(ChequeError::AmountMismatch {
                expected: parent.amount,
                provided: total,
            });
        }

        // Seal every child before touching the store: a crypto failure
        // midway through persists nothing.
        let now = Utc::now();
        let mut children = Vec::with_capacity(amounts.len());
        for &amount in amounts {
            let sealed = self.envelope.seal(
                amount,
                &parent.payer_username,
                &parent.payee_username,
                parent.expiry_date,
            )?;
            children.push(Cheque {
                id: ChequeId::new(),
                amount,
                payer_username: parent.payer_username.clone(),
                payer_realname: parent.payer_realname.clone(),
                payee_username: parent.payee_username.clone(),
                payee_realname: parent.payee_realname.clone(),
                issue_date: now,
                expiry_date: parent.expiry_date,
                status: ChequeStatus::Issued,
                parent_cheque_id: Some(parent.id),
                nonce: sealed.nonce,
                signature: sealed.signature,
                encrypted_payload: sealed.encrypted_payload,
                wrapped_key: sealed.wrapped_key,
            });
        }

        let views: Vec<ChequeView> = children.iter().map(ChequeView::from).collect();

        self.cheques
            .commit_split(parent.id, children)
            .map_err(|err| match err {
                // The split error contract reports a stale status as a
                // rejected operation, not a state machine violation.
                ChequeError::InvalidState { current } => ChequeError::InvalidOperation {
                    reason: format!("cheque is not splittable in status {current}"),
                },
                other => other,
            })?;

        tracing::info!(
            cheque = %parent.id,
            children = views.len(),
            amount = %parent.amount,
            "Cheque split"
        );

        Ok(views)
    }

    /// Read-only lookup of a cheque's public view.
    ///
    /// # Errors
    ///
    /// `ChequeNotFound` if no cheque exists under `cheque_id`.
    pub fn fetch(&self, cheque_id: ChequeId) -> Result<ChequeView> {
        Ok(ChequeView::from(&self.cheques.fetch(cheque_id)?))
    }
}
