//! Hash functions and base58 checksums.
//!
//! - [`sha256`] — transaction signing digests, legacy WIF checksums
//! - [`ripemd160`] — checksums of `PUB_K1_` / `PVT_K1_` / `SIG_K1_` text forms

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Length of the checksum appended to base58 payloads.
pub const CHECKSUM_LEN: usize = 4;

/// Key-type suffix mixed into RIPEMD-160 checksums of the `_K1_` text forms.
pub const K1_SUFFIX: &[u8] = b"K1";

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 over several slices, hashed as one contiguous message.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Checksum of the legacy formats: first four bytes of `SHA256(SHA256(data))`.
pub fn double_sha256_checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256(&sha256(data));
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Checksum of the `_K1_` formats: first four bytes of `RIPEMD160(data || suffix)`.
///
/// Legacy `EOS` public keys use an empty suffix.
pub fn ripemd160_checksum(data: &[u8], suffix: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}
