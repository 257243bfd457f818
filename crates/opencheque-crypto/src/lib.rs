//! # opencheque-crypto
//!
//! **Sealing Plane**: process key material, sealed claim envelopes, and the
//! anti-replay nonce registry.
//!
//! ## Architecture
//!
//! 1. [`ProcessKeyManager`] generates the RSA-2048 pair and AES-256 key at
//!    startup and holds them for the process lifetime
//! 2. [`CryptoEnvelope::seal`] encrypts a claim and signs its plaintext,
//!    producing the four artifacts stored on every cheque
//! 3. [`CryptoEnvelope::open`] recovers the claim at verification and
//!    settlement time, rejecting tampered or forged envelopes
//! 4. [`NonceRegistry`] consumes each claim nonce at most once, making
//!    settlement replay-proof under concurrency

pub mod envelope;
pub mod keys;
pub mod nonce;

pub use envelope::{CryptoEnvelope, SealedEnvelope};
pub use keys::{KeyProvider, ProcessKeyManager};
pub use nonce::NonceRegistry;
