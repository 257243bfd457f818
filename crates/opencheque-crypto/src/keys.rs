//! Process-lifetime key material.
//!
//! One RSA-2048 key pair and one AES-256 key are generated when the engine
//! starts and held in memory until it stops. There is no persistence and no
//! rotation: restarting the process invalidates every outstanding envelope.
//! The [`KeyProvider`] trait is the seam for swapping in externalized key
//! storage later without touching the envelope code.

use opencheque_types::constants::{AES_KEY_LEN, RSA_KEY_BITS};
use opencheque_types::{ChequeError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Source of the key material the envelope operates with.
///
/// Implementations must be cheap to call: accessors return borrowed keys and
/// are hit on every seal and open.
pub trait KeyProvider: Send + Sync {
    /// RSA public key. Wraps per-cheque symmetric keys and verifies
    /// claim signatures.
    fn public_key(&self) -> &RsaPublicKey;

    /// RSA private key. Unwraps symmetric keys and produces claim
    /// signatures.
    fn private_key(&self) -> &RsaPrivateKey;

    /// AES-256 key encrypting claim payloads.
    fn symmetric_key(&self) -> &[u8; AES_KEY_LEN];
}

/// The only [`KeyProvider`] shipped: fresh keys at construction, dropped
/// with the process.
pub struct ProcessKeyManager {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    symmetric_key: [u8; AES_KEY_LEN],
}

impl ProcessKeyManager {
    /// Generate a fresh RSA-2048 key pair and a random AES-256 key.
    ///
    /// RSA generation takes on the order of a hundred milliseconds; call
    /// once at startup. A generation failure is fatal to the engine, so
    /// the error is surfaced rather than retried here.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::CryptoFailure`] if RSA key generation fails.
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        let private_key =
            RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).map_err(|e| ChequeError::CryptoFailure {
                reason: format!("RSA key generation failed: {e}"),
            })?;
        let public_key = RsaPublicKey::from(&private_key);

        let mut symmetric_key = [0u8; AES_KEY_LEN];
        OsRng.fill_bytes(&mut symmetric_key);

        Ok(Self {
            private_key,
            public_key,
            symmetric_key,
        })
    }
}

impl KeyProvider for ProcessKeyManager {
    fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    fn symmetric_key(&self) -> &[u8; AES_KEY_LEN] {
        &self.symmetric_key
    }
}
