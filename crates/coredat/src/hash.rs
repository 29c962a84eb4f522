use crate::{Error, Result};
use bitcoin::hashes::Hash;
use std::fmt;
use std::str::FromStr;

/// 32-byte identifier of a block or transaction.
///
/// The bytes are kept in natural order, i.e. the order in which Bitcoin tools display the hash
/// as hex and in which hashes are compared. Bitcoin Core serializes hashes the other way
/// around, see [`Hash256::from_stored`] and [`Hash256::to_stored`].
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// Length of a hash in bytes.
    pub const LEN: usize = 32;

    /// Constructs a hash from bytes in natural order.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash with all bytes set to zero, the previous hash of a genesis block.
    pub const fn all_zeros() -> Self {
        Self([0u8; 32])
    }

    /// Constructs a hash from a slice in natural order.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidHashLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Constructs a hash from bytes in stored (reversed) order.
    pub fn from_stored(bytes: [u8; 32]) -> Self {
        Self(bytes).reversed()
    }

    /// Parses a hash from exactly 64 hex characters in natural order.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != Self::LEN * 2 {
            return Err(Error::InvalidHexLength {
                input: s.to_string(),
                len: s.len(),
            });
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|source| Error::InvalidHex {
            input: s.to_string(),
            source,
        })?;

        Ok(Self(bytes))
    }

    /// Returns a copy with the byte order reversed.
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0;
        bytes.reverse();
        Self(bytes)
    }

    /// Returns the bytes in stored (reversed) order, as used in keys and record values.
    pub fn to_stored(&self) -> [u8; 32] {
        self.reversed().0
    }

    /// Returns the bytes in natural order.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hex encoding in natural order.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// rust-bitcoin keeps hashes in their serialized byte order and displays them reversed,
// which is exactly our stored order.
impl From<bitcoin::BlockHash> for Hash256 {
    fn from(hash: bitcoin::BlockHash) -> Self {
        Self::from_stored(hash.to_byte_array())
    }
}

impl From<Hash256> for bitcoin::BlockHash {
    fn from(hash: Hash256) -> Self {
        bitcoin::BlockHash::from_byte_array(hash.to_stored())
    }
}

impl From<bitcoin::Txid> for Hash256 {
    fn from(txid: bitcoin::Txid) -> Self {
        Self::from_stored(txid.to_byte_array())
    }
}

impl From<Hash256> for bitcoin::Txid {
    fn from(hash: Hash256) -> Self {
        bitcoin::Txid::from_byte_array(hash.to_stored())
    }
}
