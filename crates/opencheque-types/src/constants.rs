//! System-wide constants for the OpenCheque engine.

/// RSA modulus size in bits for the process key pair.
pub const RSA_KEY_BITS: usize = 2048;

/// AES-256 key length in bytes.
pub const AES_KEY_LEN: usize = 32;

/// AES-GCM IV length in bytes. The IV is prepended to every ciphertext.
pub const GCM_IV_LEN: usize = 12;

/// Anti-replay nonce length in bytes.
pub const NONCE_LEN: usize = 16;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenCheque";
