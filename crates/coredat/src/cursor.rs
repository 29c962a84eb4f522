//! Positional decoding of the serialization used in Bitcoin Core's databases.

use crate::{Error, Hash256, Result};
use bitcoin::consensus::serialize;
use txoutset::var_int::VarInt;

/// Sequential reader over an immutable byte buffer.
///
/// Every read advances the position by the number of bytes consumed and fails with
/// [`Error::UnexpectedEof`] if not enough bytes remain. The position never moves backwards.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Constructs a new instance of [`ByteCursor`] positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEof {
                field,
                position: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, field)?);
        Ok(out)
    }

    /// Reads a varint in Bitcoin Core's `VARINT` format.
    ///
    /// Each byte contributes its low 7 bits, most significant group first. A set high bit means
    /// another byte follows, and the accumulated value is incremented by one before continuing.
    /// This makes every value have exactly one encoding, and is what distinguishes the format
    /// from LEB128.
    ///
    /// https://github.com/bitcoin/bitcoin/blob/6f9db1ebcab4064065ccd787161bf2b87e03cc1f/src/serialize.h#L382
    pub fn read_var_int(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut n = 0u64;
        loop {
            let [byte] = self.read_array::<1>("varint")?;
            if n > (u64::MAX >> 7) {
                return Err(Error::VarIntOverflow { position: start });
            }
            n = (n << 7) | u64::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(n);
            }
            n = n
                .checked_add(1)
                .ok_or(Error::VarIntOverflow { position: start })?;
        }
    }

    /// Reads 4 bytes as a big-endian `u32`.
    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32> {
        self.read_array(field).map(u32::from_be_bytes)
    }

    /// Reads 4 bytes as a big-endian `i32`.
    pub fn read_i32_be(&mut self, field: &'static str) -> Result<i32> {
        self.read_array(field).map(i32::from_be_bytes)
    }

    /// Reads 4 bytes as a little-endian `u32`.
    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32> {
        self.read_array(field).map(u32::from_le_bytes)
    }

    /// Reads a 32-byte hash stored in reversed order and returns it in natural order.
    pub fn read_hash(&mut self, field: &'static str) -> Result<Hash256> {
        self.read_array(field).map(Hash256::from_stored)
    }
}

/// Appends `n` encoded in Bitcoin Core's `VARINT` format, the inverse of
/// [`ByteCursor::read_var_int`].
pub fn write_var_int(out: &mut Vec<u8>, n: u64) {
    out.extend(serialize(&VarInt::new(n)));
}
