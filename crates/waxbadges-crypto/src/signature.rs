//! Canonical recoverable signatures (`SIG_K1_...`).
//!
//! The chain recovers the signer's public key from each signature, so
//! signatures carry a recovery header byte ahead of `r || s`. Nodes reject
//! signatures whose `r` or `s` has its top bit set or a redundant leading
//! zero byte; [`PrivateKey::sign_digest`] resamples until that holds.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use k256::ecdsa::{RecoveryId, VerifyingKey};

use crate::hash::K1_SUFFIX;
use crate::keys::{decode_base58, encode_with_checksum, split_checksum};
use crate::{hash, CryptoError, PrivateKey, PublicKey, Result};

/// Length of a compact recoverable signature: header byte plus `r || s`.
pub const SIGNATURE_LEN: usize = 65;

/// Header byte offset for compressed-key compact signatures.
const COMPACT_HEADER_BASE: u8 = 27 + 4;

/// Upper bound on resampling before giving up on a canonical signature.
pub const MAX_SIGNING_ATTEMPTS: usize = 64;

const SIGNATURE_K1_PREFIX: &str = "SIG_K1_";

/// A compact recoverable secp256k1 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LEN],
}

impl Signature {
    /// Wrap raw compact signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw compact bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.bytes
    }

    /// Parse `SIG_K1_...`.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text
            .trim()
            .strip_prefix(SIGNATURE_K1_PREFIX)
            .ok_or_else(|| CryptoError::InvalidSignature("missing SIG_K1_ prefix".into()))?;
        let raw = decode_base58(body)?;
        let (sig, checksum) = split_checksum(&raw)?;
        if hash::ripemd160_checksum(sig, K1_SUFFIX) != checksum {
            return Err(CryptoError::Checksum);
        }
        let bytes: [u8; SIGNATURE_LEN] = sig.try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                sig.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Whether the chain will accept this signature's encoding.
    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.bytes)
    }

    /// Recover the public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<PublicKey> {
        let header = self.bytes[0]
            .checked_sub(COMPACT_HEADER_BASE)
            .ok_or_else(|| CryptoError::InvalidSignature("bad recovery header".into()))?;
        let recovery_id = RecoveryId::from_byte(header)
            .ok_or_else(|| CryptoError::InvalidSignature("bad recovery id".into()))?;
        let signature = k256::ecdsa::Signature::from_slice(&self.bytes[1..])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|e| CryptoError::Recovery(e.to_string()))?;
        Ok(PublicKey::from_verifying_key(key))
    }
}

impl PrivateKey {
    /// Sign a 32-byte digest, producing a canonical recoverable signature.
    ///
    /// The first attempt is deterministic (RFC 6979); later attempts mix in
    /// fresh randomness.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature> {
        let signing_key = self.signing_key();
        let verifying_key = signing_key.verifying_key();

        for attempt in 0..MAX_SIGNING_ATTEMPTS {
            let signed = if attempt == 0 {
                signing_key
                    .sign_prehash_recoverable(digest)
                    .map(|(sig, _)| sig)
            } else {
                RandomizedPrehashSigner::<k256::ecdsa::Signature>::sign_prehash_with_rng(
                    signing_key,
                    &mut rand::rngs::OsRng,
                    digest,
                )
            };
            let signature = signed.map_err(|e| CryptoError::Signing(e.to_string()))?;

            let recovery_id =
                RecoveryId::trial_recovery_from_prehash(verifying_key, digest, &signature)
                    .map_err(|e| CryptoError::Recovery(e.to_string()))?;

            let mut bytes = [0u8; SIGNATURE_LEN];
            bytes[0] = COMPACT_HEADER_BASE + recovery_id.to_byte();
            bytes[1..].copy_from_slice(&signature.to_bytes());

            if is_canonical(&bytes) {
                return Ok(Signature { bytes });
            }
        }

        Err(CryptoError::Signing(format!(
            "no canonical signature after {MAX_SIGNING_ATTEMPTS} attempts"
        )))
    }
}

/// The chain's canonical-encoding rule over a compact signature.
pub fn is_canonical(c: &[u8; SIGNATURE_LEN]) -> bool {
    (c[1] & 0x80) == 0
        && !(c[1] == 0 && (c[2] & 0x80) == 0)
        && (c[33] & 0x80) == 0
        && !(c[33] == 0 && (c[34] & 0x80) == 0)
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SIGNATURE_K1_PREFIX}{}",
            encode_with_checksum(&self.bytes, K1_SUFFIX)
        )
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
