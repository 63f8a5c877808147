//! 64-bit account and action names.
//!
//! A name packs up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`
//! into a `u64`: twelve 5-bit symbols from the high bits down, then a final
//! 4-bit symbol. Only the 4-bit alphabet (`.`, `1`-`5`, `a`-`j`) fits in the
//! 13th position.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ChainError;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Longest name the encoding can represent.
pub const MAX_NAME_LEN: usize = 13;

/// An encoded account, action, table or permission name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u64);

impl Name {
    /// Wrap an already-encoded value.
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// The encoded value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Encode a name, rejecting anything that would not round-trip.
    pub fn new(text: &str) -> Result<Self, ChainError> {
        let invalid = |reason: &str| ChainError::InvalidName {
            name: text.to_string(),
            reason: reason.to_string(),
        };

        let bytes = text.as_bytes();
        if bytes.len() > MAX_NAME_LEN {
            return Err(invalid("longer than 13 characters"));
        }

        let mut value = 0u64;
        for (i, &c) in bytes.iter().enumerate() {
            let symbol = char_to_symbol(c).ok_or_else(|| invalid("character outside [.1-5a-z]"))?;
            if i < 12 {
                value |= u64::from(symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(invalid("13th character must be in [.1-5a-j]"));
                }
                value |= u64::from(symbol);
            }
        }

        let name = Self(value);
        if name.to_string() != text {
            return Err(invalid("trailing dots"));
        }
        Ok(name)
    }
}

fn char_to_symbol(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'z' => Some(c - b'a' + 6),
        b'1'..=b'5' => Some(c - b'1' + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let text: String = out.iter().map(|&b| b as char).collect();
        f.write_str(text.trim_end_matches('.'))
    }
}

impl FromStr for Name {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::new(&text).map_err(serde::de::Error::custom)
    }
}
