//! secp256k1 keys in the EOSIO text formats.
//!
//! Private keys are accepted either as legacy WIF (`5K...`) or as
//! `PVT_K1_...`. Public keys render as `PUB_K1_...` or the legacy
//! `EOS...` form. Both wrap `k256` with WAX-specific encodings.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::hash::{self, CHECKSUM_LEN, K1_SUFFIX};
use crate::{CryptoError, Result};

/// Version byte of a WIF-encoded private key.
const WIF_VERSION: u8 = 0x80;

/// Trailing flag of a WIF key that asks for compressed public keys.
const WIF_COMPRESSED_FLAG: u8 = 0x01;

const PRIVATE_K1_PREFIX: &str = "PVT_K1_";
const PUBLIC_K1_PREFIX: &str = "PUB_K1_";
const PUBLIC_LEGACY_PREFIX: &str = "EOS";

/// Length of a raw secp256k1 secret scalar.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a compressed SEC1 public key.
pub const PUBLIC_KEY_LEN: usize = 33;

/// A ledger signing key.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

/// A ledger public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PrivateKey {
    /// Create a private key from its raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse a private key from either supported text form.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        match text.strip_prefix(PRIVATE_K1_PREFIX) {
            Some(body) => Self::from_k1(body),
            None => Self::from_wif(text),
        }
    }

    fn from_wif(text: &str) -> Result<Self> {
        let raw = decode_base58(text)?;
        let (payload, checksum) = split_checksum(&raw)?;
        if hash::double_sha256_checksum(payload) != checksum {
            return Err(CryptoError::Checksum);
        }
        let secret = match payload {
            [WIF_VERSION, secret @ ..] if secret.len() == PRIVATE_KEY_LEN => secret,
            [WIF_VERSION, secret @ .., WIF_COMPRESSED_FLAG]
                if secret.len() == PRIVATE_KEY_LEN =>
            {
                secret
            }
            [WIF_VERSION, ..] => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: PRIVATE_KEY_LEN,
                    actual: payload.len() - 1,
                })
            }
            _ => return Err(CryptoError::InvalidKey("unexpected WIF version byte".into())),
        };
        Self::from_bytes(secret)
    }

    fn from_k1(body: &str) -> Result<Self> {
        let raw = decode_base58(body)?;
        let (secret, checksum) = split_checksum(&raw)?;
        if hash::ripemd160_checksum(secret, K1_SUFFIX) != checksum {
            return Err(CryptoError::Checksum);
        }
        Self::from_bytes(secret)
    }

    /// Render as legacy WIF.
    pub fn to_wif(&self) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(1 + PRIVATE_KEY_LEN + CHECKSUM_LEN));
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.inner.to_bytes());
        let checksum = hash::double_sha256_checksum(&payload);
        payload.extend_from_slice(&checksum);
        bs58::encode(payload.as_slice()).into_string()
    }

    /// Render as `PVT_K1_...`.
    pub fn to_k1_string(&self) -> String {
        let mut payload = Zeroizing::new(self.inner.to_bytes().to_vec());
        let checksum = hash::ripemd160_checksum(&payload, K1_SUFFIX);
        payload.extend_from_slice(&checksum);
        format!("{PRIVATE_K1_PREFIX}{}", bs58::encode(payload.as_slice()).into_string())
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.verifying_key().clone(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key())
            .finish()
    }
}

impl PublicKey {
    /// Create a public key from compressed or uncompressed SEC1 bytes.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse either `PUB_K1_...` or legacy `EOS...`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (body, suffix) = if let Some(body) = text.strip_prefix(PUBLIC_K1_PREFIX) {
            (body, K1_SUFFIX)
        } else if let Some(body) = text.strip_prefix(PUBLIC_LEGACY_PREFIX) {
            (body, &b""[..])
        } else {
            return Err(CryptoError::InvalidKey("unknown public key prefix".into()));
        };
        let raw = decode_base58(body)?;
        let (key, checksum) = split_checksum(&raw)?;
        if hash::ripemd160_checksum(key, suffix) != checksum {
            return Err(CryptoError::Checksum);
        }
        if key.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                actual: key.len(),
            });
        }
        Self::from_sec1_bytes(key)
    }

    /// Compressed SEC1 encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Render as legacy `EOS...`.
    pub fn to_legacy_string(&self) -> String {
        format!("{PUBLIC_LEGACY_PREFIX}{}", encode_with_checksum(&self.to_bytes(), b""))
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey) -> Self {
        Self { inner }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PUBLIC_K1_PREFIX}{}",
            encode_with_checksum(&self.to_bytes(), K1_SUFFIX)
        )
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Base58-decode into a buffer that is wiped on drop.
pub(crate) fn decode_base58(text: &str) -> Result<Zeroizing<Vec<u8>>> {
    bs58::decode(text)
        .into_vec()
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::Base58(e.to_string()))
}

/// Split a decoded payload into body and trailing checksum.
pub(crate) fn split_checksum(raw: &[u8]) -> Result<(&[u8], &[u8])> {
    if raw.len() <= CHECKSUM_LEN {
        return Err(CryptoError::Base58(format!(
            "payload too short: {} bytes",
            raw.len()
        )));
    }
    Ok(raw.split_at(raw.len() - CHECKSUM_LEN))
}

/// Base58 of `data || RIPEMD160(data || suffix)[..4]`.
pub(crate) fn encode_with_checksum(data: &[u8], suffix: &[u8]) -> String {
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&hash::ripemd160_checksum(data, suffix));
    bs58::encode(payload).into_string()
}
