//! Binary packing for transactions.
//!
//! The chain's ABI serialization is little-endian with LEB128-style
//! `varuint32` length prefixes for vectors and byte strings.
//!
//! ```text
//! u8 / u16 / u32 / u64  little-endian, fixed width
//! varuint32             7 bits per byte, high bit = continuation
//! bytes                 varuint32 length || raw bytes
//! vector<T>             varuint32 count  || T...
//! ```

use crate::name::Name;
use crate::{ChainError, Result};

/// Append-only packer.
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    /// Create an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn name(&mut self, value: Name) -> &mut Self {
        self.u64(value.as_u64())
    }

    pub fn varuint32(&mut self, mut value: u32) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Write a vector or byte-string length prefix.
    pub fn len_prefix(&mut self, len: usize) -> Result<&mut Self> {
        let len = u32::try_from(len)
            .map_err(|_| ChainError::Serialization(format!("length {len} exceeds varuint32")))?;
        Ok(self.varuint32(len))
    }

    /// Write a length-prefixed byte string.
    pub fn bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.len_prefix(data.len())?;
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    /// Finish and take the packed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varuint(value: u32) -> Vec<u8> {
        let mut p = Packer::new();
        p.varuint32(value);
        p.into_bytes()
    }

    #[test]
    fn test_varuint32_encoding() {
        assert_eq!(varuint(0), vec![0x00]);
        assert_eq!(varuint(127), vec![0x7f]);
        assert_eq!(varuint(128), vec![0x80, 0x01]);
        assert_eq!(varuint(300), vec![0xac, 0x02]);
        assert_eq!(varuint(u32::MAX), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let mut p = Packer::new();
        p.u8(0x01).u16(0x0302).u32(0x0706_0504).u64(0x0f0e_0d0c_0b0a_0908);
        assert_eq!(p.into_bytes(), (1u8..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn test_bytes_are_length_prefixed() {
        let mut p = Packer::new();
        p.bytes(&[0xaa, 0xbb]).expect("pack");
        assert_eq!(p.into_bytes(), vec![0x02, 0xaa, 0xbb]);
    }

    #[test]
    fn test_name_packs_as_u64() {
        let mut p = Packer::new();
        p.name(Name::new("eosio").expect("valid name"));
        assert_eq!(
            p.into_bytes(),
            0x5530_ea00_0000_0000u64.to_le_bytes().to_vec()
        );
    }
}
