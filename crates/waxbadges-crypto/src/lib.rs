//! # waxbadges-crypto
//!
//! Key handling and transaction signing for the WAX ledger.
//!
//! WAX inherits the EOSIO key formats: secp256k1 keys rendered in base58
//! with a RIPEMD-160 checksum, and compact recoverable signatures that the
//! chain only accepts in canonical form.
//!
//! ## Modules
//!
//! - [`hash`] — SHA-256 and the RIPEMD-160 / double-SHA-256 checksums
//! - [`keys`] — Private key parsing (WIF, `PVT_K1_`) and public key rendering
//! - [`signature`] — Canonical `SIG_K1_` signatures and key recovery

pub mod hash;
pub mod keys;
pub mod signature;

pub use keys::{PrivateKey, PublicKey};
pub use signature::Signature;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Base58 text could not be decoded.
    #[error("base58 decode failed: {0}")]
    Base58(String),

    /// Embedded checksum did not match the payload.
    #[error("checksum mismatch")]
    Checksum,

    /// Key material is malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Signature text or bytes are malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Signing failed or never produced a canonical signature.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Public key recovery failed.
    #[error("key recovery failed: {0}")]
    Recovery(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
