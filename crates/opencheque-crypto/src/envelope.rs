//! Sealed claim envelopes.
//!
//! A cheque's claim travels as a [`SealedEnvelope`]: the canonical claim
//! serialized to JSON and encrypted with AES-256-GCM (random 12-byte IV
//! prepended to the ciphertext, the whole blob base64-encoded), the AES key
//! wrapped with RSA-OAEP over SHA-256, and an RSA PKCS#1 v1.5 signature
//! over the *plaintext* claim. Signing the plaintext binds the issuer to
//! the claim itself, independent of who later re-encrypts or re-wraps it.
//!
//! GCM authenticates as it decrypts, so a forged or bit-flipped ciphertext
//! is rejected outright rather than decrypted to garbage. Decryption errors
//! stay vague on purpose: the difference between a wrong key and a
//! corrupted blob is nobody's business.

use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as GcmNonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::Oaep;
use rust_decimal::Decimal;
use sha2::Sha256;

use opencheque_types::constants::{GCM_IV_LEN, NONCE_LEN};
use opencheque_types::{CanonicalClaim, Cheque, ChequeError, Nonce, Result};

use crate::keys::KeyProvider;

/// Everything [`CryptoEnvelope::seal`] produces for one cheque.
///
/// All four artifacts are stored on the cheque record; none is useful
/// without the process private key.
#[derive(Debug, Clone)]
pub struct SealedEnvelope {
    /// The fresh anti-replay nonce baked into the sealed claim.
    pub nonce: Nonce,
    /// Base64 of `iv || ciphertext` for the JSON-serialized claim.
    pub encrypted_payload: String,
    /// The AES key, RSA-OAEP-encrypted to the process public key.
    pub wrapped_key: Vec<u8>,
    /// PKCS#1 v1.5 signature over [`CanonicalClaim::signing_payload`].
    pub signature: Vec<u8>,
}

/// Seals claims into envelopes and opens them back up.
///
/// Holds the signing and verifying keys derived from the injected
/// [`KeyProvider`] so they are built once, not per call.
pub struct CryptoEnvelope {
    keys: Arc<dyn KeyProvider>,
    signing_key: SigningKey<Sha256>,
    verifying_key: VerifyingKey<Sha256>,
}

impl CryptoEnvelope {
    #[must_use]
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        let signing_key = SigningKey::<Sha256>::new(keys.private_key().clone());
        let verifying_key = VerifyingKey::<Sha256>::new(keys.public_key().clone());
        Self {
            keys,
            signing_key,
            verifying_key,
        }
    }

    /// Seal a claim over the given terms.
    ///
    /// Generates the fresh anti-replay nonce here, so no two seals can
    /// share one. Never returns partial artifacts: if any step fails the
    /// whole operation fails and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::CryptoFailure`] if serialization, encryption,
    /// key wrapping, or signing fails.
    pub fn seal(
        &self,
        amount: Decimal,
        payer: &str,
        payee: &str,
        expiry: DateTime<Utc>,
    ) -> Result<SealedEnvelope> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let claim = CanonicalClaim {
            amount,
            payer: payer.to_string(),
            payee: payee.to_string(),
            expiry,
            nonce: Nonce::from_bytes(nonce_bytes),
        };

        let plaintext = serde_json::to_vec(&claim).map_err(|e| ChequeError::CryptoFailure {
            reason: format!("claim serialization failed: {e}"),
        })?;

        let cipher = Aes256Gcm::new_from_slice(self.keys.symmetric_key()).map_err(|_| {
            ChequeError::CryptoFailure {
                reason: "symmetric key rejected by cipher".to_string(),
            }
        })?;

        let mut iv = [0u8; GCM_IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = cipher
            .encrypt(GcmNonce::from_slice(&iv), plaintext.as_slice())
            .map_err(|_| ChequeError::CryptoFailure {
                reason: "payload encryption failed".to_string(),
            })?;

        // iv || ciphertext in one blob so the opener never tracks the IV
        // separately.
        let mut blob = Vec::with_capacity(GCM_IV_LEN + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        let encrypted_payload = STANDARD.encode(&blob);

        let wrapped_key = self
            .keys
            .public_key()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), self.keys.symmetric_key())
            .map_err(|e| ChequeError::CryptoFailure {
                reason: format!("key wrap failed: {e}"),
            })?;

        let signature = self
            .signing_key
            .try_sign(&claim.signing_payload())
            .map_err(|e| ChequeError::CryptoFailure {
                reason: format!("claim signing failed: {e}"),
            })?
            .to_vec();

        Ok(SealedEnvelope {
            nonce: claim.nonce,
            encrypted_payload,
            wrapped_key,
            signature,
        })
    }

    /// Open a cheque's envelope back into the claim it sealed.
    ///
    /// Unwraps the AES key with the private key, decrypts the payload, and
    /// verifies the signature over the recovered plaintext. The GCM tag
    /// check happens inside decryption, so tampering surfaces as
    /// [`ChequeError::DecryptionFailure`] before the signature is ever
    /// looked at.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::DecryptionFailure`] if the key unwrap, base64
    /// decode, payload decryption, or claim deserialization fails, and
    /// [`ChequeError::SignatureInvalid`] if the recovered claim does not
    /// verify against the process public key.
    pub fn open(&self, cheque: &Cheque) -> Result<CanonicalClaim> {
        let key_bytes = self
            .keys
            .private_key()
            .decrypt(Oaep::new::<Sha256>(), &cheque.wrapped_key)
            .map_err(|_| ChequeError::DecryptionFailure)?;

        let blob = STANDARD
            .decode(&cheque.encrypted_payload)
            .map_err(|_| ChequeError::DecryptionFailure)?;
        if blob.len() < GCM_IV_LEN {
            return Err(ChequeError::DecryptionFailure);
        }
        let (iv, ciphertext) = blob.split_at(GCM_IV_LEN);

        let cipher =
            Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| ChequeError::DecryptionFailure)?;
        let plaintext = cipher
            .decrypt(GcmNonce::from_slice(iv), ciphertext)
            .map_err(|_| ChequeError::DecryptionFailure)?;

        let claim: CanonicalClaim =
            serde_json::from_slice(&plaintext).map_err(|_| ChequeError::DecryptionFailure)?;

        self.verify_signature(&claim, &cheque.signature)?;
        Ok(claim)
    }

    fn verify_signature(&self, claim: &CanonicalClaim, signature: &[u8]) -> Result<()> {
        let signature =
            Signature::try_from(signature).map_err(|_| ChequeError::SignatureInvalid)?;
        self.verifying_key
            .verify(&claim.signing_payload(), &signature)
            .map_err(|_| ChequeError::SignatureInvalid)
    }
}
