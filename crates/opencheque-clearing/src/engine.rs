//! Verification and settlement.
//!
//! Settlement is the linearization point of the whole protocol: before it
//! a cheque's value is a promise, after it funds have moved and the record
//! is immutable. Everything here is arranged so that point is crossed at
//! most once per cheque, no matter how many callers race for it.
//!
//! Two mechanisms enforce that, in layers. A per-cheque lock serializes
//! every status writer (settle, split, the expiry sweep), and the store's
//! compare-and-set transition rejects any writer that somehow saw a stale
//! status anyway. Within settlement the undoable step comes first: the
//! nonce is reserved before funds move, and released again if the transfer
//! fails, so an aborted settlement leaves no trace.

use std::sync::{Arc, PoisonError};

use opencheque_crypto::{CryptoEnvelope, NonceRegistry};
use opencheque_ledger::{AccountStore, ChequeLocks, ChequeStore};
use opencheque_types::{
    Cheque, ChequeError, ChequeId, ChequeStatus, Result, TransferPayload,
};

/// Verifies, settles, and expires cheques.
///
/// All entry points take `&self`; shared state lives in the injected
/// stores and registries.
pub struct ClearingEngine {
    envelope: Arc<CryptoEnvelope>,
    nonces: Arc<NonceRegistry>,
    cheques: Arc<dyn ChequeStore>,
    accounts: Arc<dyn AccountStore>,
    locks: Arc<ChequeLocks>,
}

impl ClearingEngine {
    #[must_use]
    pub fn new(
        envelope: Arc<CryptoEnvelope>,
        nonces: Arc<NonceRegistry>,
        cheques: Arc<dyn ChequeStore>,
        accounts: Arc<dyn AccountStore>,
        locks: Arc<ChequeLocks>,
    ) -> Self {
        Self {
            envelope,
            nonces,
            cheques,
            accounts,
            locks,
        }
    }

    /// Check that a cheque is currently redeemable by `requester`.
    ///
    /// Read-only and side-effect-free; safe to call repeatedly. The nonce
    /// is peeked, never consumed.
    ///
    /// # Errors
    ///
    /// `ChequeNotFound`, `InvalidState` (not ISSUED), `ChequeExpired`,
    /// `Unauthorized` (requester is not the named payee),
    /// `DecryptionFailure` / `SignatureInvalid` (envelope or record
    /// tampered with), or `ReplayDetected` (nonce already consumed).
    pub fn verify(&self, cheque_id: ChequeId, requester: &str) -> Result<()> {
        self.verify_cheque(cheque_id, requester).map(|_| ())
    }

    /// Settle a cheque: move the funds and mark it CLEARED, exactly once.
    ///
    /// Re-runs the full verification under the cheque's lock, re-checks
    /// the payer's funds (balances may have moved since issuance), then
    /// reserves the nonce, transfers, and flips the status. A failed
    /// transfer releases the reservation; nothing has moved.
    ///
    /// # Errors
    ///
    /// Everything [`verify`](Self::verify) returns, plus `AccountNotFound`
    /// and `InsufficientFunds`.
    pub fn settle(&self, cheque_id: ChequeId, requester: &str) -> Result<()> {
        let lock = self.locks.lock_for(cheque_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Under the lock the cheque cannot move between these checks and
        // the transition below.
        let cheque = self.verify_cheque(cheque_id, requester)?;

        let payer = self.accounts.fetch(&cheque.payer_username)?;
        self.accounts.fetch(&cheque.payee_username)?;
        if payer.balance < cheque.amount {
            return Err(ChequeError::InsufficientFunds {
                needed: cheque.amount,
                available: payer.balance,
            });
        }

        // Reserve before moving funds: the reservation is the only step
        // that can be undone with nothing having happened.
        if !self.nonces.reserve(cheque.nonce) {
            return Err(ChequeError::ReplayDetected {
                nonce: cheque.nonce.to_string(),
            });
        }

        if let Err(err) = self.accounts.transfer(
            &cheque.payer_username,
            &cheque.payee_username,
            cheque.amount,
        ) {
            self.nonces.release(cheque.nonce);
            return Err(err);
        }

        if let Err(err) =
            self.cheques
                .transition(cheque.id, ChequeStatus::Issued, ChequeStatus::Cleared)
        {
            // Unreachable while every status writer honors the per-cheque
            // lock; undo in reverse order if a foreign writer got through.
            if let Err(undo) = self.accounts.transfer(
                &cheque.payee_username,
                &cheque.payer_username,
                cheque.amount,
            ) {
                tracing::error!(
                    cheque = %cheque.id,
                    error = %undo,
                    "Settlement rollback transfer failed; ledger needs manual repair"
                );
            }
            self.nonces.release(cheque.nonce);
            return Err(err);
        }

        tracing::info!(
            cheque = %cheque.id,
            payer = %cheque.payer_username,
            payee = %cheque.payee_username,
            amount = %cheque.amount,
            "Cheque settled"
        );
        Ok(())
    }

    /// Move every ISSUED cheque whose expiry has passed to EXPIRED.
    ///
    /// Idempotent, and safe to run concurrently with settlement: the sweep
    /// takes the same per-cheque lock, and a cheque that settles first
    /// simply loses its ISSUED status and is skipped.
    ///
    /// Returns the number of cheques expired by this run.
    pub fn expire_sweep(&self) -> Result<usize> {
        let mut expired = 0usize;
        for cheque in self.cheques.issued()? {
            if !cheque.is_expired() {
                continue;
            }

            let lock = self.locks.lock_for(cheque.id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

            match self
                .cheques
                .transition(cheque.id, ChequeStatus::Issued, ChequeStatus::Expired)
            {
                Ok(()) => expired += 1,
                // Lost the race to a settle or split; their write stands.
                Err(ChequeError::InvalidState { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if expired > 0 {
            tracing::info!(count = expired, "Expiry sweep completed");
        }
        Ok(expired)
    }

    /// The hand-off bundle for presenting a cheque out-of-band (QR, P2P).
    ///
    /// Contains the encrypted payload, signature, and nonce; never the
    /// wrapped key. Exported regardless of status, since the receiving
    /// side verifies before relying on it.
    ///
    /// # Errors
    ///
    /// `ChequeNotFound` if no cheque exists under `cheque_id`.
    pub fn transfer_payload(&self, cheque_id: ChequeId) -> Result<TransferPayload> {
        Ok(TransferPayload::from(&self.cheques.fetch(cheque_id)?))
    }

    /// The shared verification sequence behind `verify` and `settle`.
    ///
    /// Settle re-runs the whole sequence under the cheque's lock even when
    /// the caller verified moments earlier: time advances and statuses move
    /// between calls, and an expired or already-cleared cheque must never
    /// clear again.
    fn verify_cheque(&self, cheque_id: ChequeId, requester: &str) -> Result<Cheque> {
        let cheque = self.cheques.fetch(cheque_id)?;

        if cheque.status != ChequeStatus::Issued {
            return Err(ChequeError::InvalidState {
                current: cheque.status,
            });
        }
        if cheque.is_expired() {
            return Err(ChequeError::ChequeExpired(cheque.id));
        }
        if requester != cheque.payee_username {
            return Err(ChequeError::Unauthorized {
                requester: requester.to_string(),
            });
        }

        let claim = self.envelope.open(&cheque)?;
        if claim != cheque.claim() {
            // The envelope says one thing, the record another: the record
            // was tampered with after sealing.
            return Err(ChequeError::SignatureInvalid);
        }

        if self.nonces.is_consumed(claim.nonce) {
            return Err(ChequeError::ReplayDetected {
                nonce: claim.nonce.to_string(),
            });
        }

        Ok(cheque)
    }
}
