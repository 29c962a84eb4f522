//! Codec of the `b` records of `blocks/index`.
//!
//! Key: `b` followed by the block hash in stored order.
//!
//! Value, strictly positional:
//!
//! | field | encoding | present |
//! |---|---|---|
//! | client version | varint | always |
//! | height | varint | always |
//! | status | varint | always |
//! | tx count | varint | always |
//! | file number | varint | any `HAVE_*` flag |
//! | data position | varint | `HAVE_DATA` |
//! | undo position | varint | `HAVE_UNDO` |
//! | block version | 4 bytes | always |
//! | previous hash | 32 bytes, reversed | always |
//! | merkle root | 32 bytes, reversed | always |
//! | time, bits, nonce | 4 bytes each | always |
//!
//! https://github.com/bitcoin/bitcoin/blob/6f9db1ebcab4064065ccd787161bf2b87e03cc1f/src/chain.h#L374

use crate::cursor::{ByteCursor, write_var_int};
use crate::store::KeyValueStore;
use crate::{BlockStatus, Error, Hash256, Result};

/// Key tag of block index records.
pub const BLOCK_INDEX_PREFIX: u8 = b'b';

const KEY_LEN: usize = 1 + Hash256::LEN;

/// Metadata of one block as recorded by the block index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndexEntry {
    /// Block hash.
    pub hash: Hash256,
    /// Version of the client that wrote the record.
    pub version: i32,
    /// Block height.
    pub height: i32,
    /// Validation and storage status.
    pub status: BlockStatus,
    /// Number of transactions.
    pub tx_count: u32,
    /// Number of the `blk`/`rev` file, `0` unless `status.have_any()`.
    pub file_number: i32,
    /// Position of the block data in the `blk` file, `0` unless `status.have_data()`.
    pub data_pos: u32,
    /// Position of the undo data in the `rev` file, `0` unless `status.have_undo()`.
    pub undo_pos: u32,
    /// Block header version.
    pub block_version: i32,
    /// Hash of the previous block, all zeros for genesis.
    pub previous_hash: Hash256,
    /// Merkle root of the transactions.
    pub merkle_root: Hash256,
    /// Block time.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Nonce.
    pub nonce: u32,
}

impl BlockIndexEntry {
    /// Decodes a record from its store key and value.
    pub fn decode(key: &[u8], value: &[u8]) -> Result<Self> {
        let hash = decode_key(key)?;
        decode_value(hash, value).map_err(|err| Error::BlockIndexRecord {
            hash,
            source: Box::new(err),
        })
    }

    /// Returns the store key of this record.
    pub fn storage_key(&self) -> [u8; KEY_LEN] {
        block_index_key(&self.hash)
    }

    /// Encodes the record value, the inverse of [`BlockIndexEntry::decode`].
    ///
    /// Position fields whose flag is clear are not written.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + 4 + 64 + 12);

        write_var_int(&mut out, self.version as u64);
        write_var_int(&mut out, self.height as u64);
        write_var_int(&mut out, u64::from(self.status.bits()));
        write_var_int(&mut out, u64::from(self.tx_count));

        if self.status.have_any() {
            write_var_int(&mut out, self.file_number as u64);
        }
        if self.status.have_data() {
            write_var_int(&mut out, u64::from(self.data_pos));
        }
        if self.status.have_undo() {
            write_var_int(&mut out, u64::from(self.undo_pos));
        }

        out.extend(self.block_version.to_be_bytes());
        out.extend(self.previous_hash.to_stored());
        out.extend(self.merkle_root.to_stored());
        out.extend(self.time.to_be_bytes());
        out.extend(self.bits.to_be_bytes());
        out.extend(self.nonce.to_be_bytes());

        out
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_hash.is_zero()
    }
}

/// Returns the store key of the block index record of `hash`.
pub fn block_index_key(hash: &Hash256) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    key[0] = BLOCK_INDEX_PREFIX;
    key[1..].copy_from_slice(&hash.to_stored());
    key
}

fn decode_key(key: &[u8]) -> Result<Hash256> {
    if key.first() != Some(&BLOCK_INDEX_PREFIX) {
        return Err(Error::invalid_key(key, "expected `b` prefix"));
    }
    if key.len() != KEY_LEN {
        return Err(Error::invalid_key(key, "expected `b` + 32 byte block hash"));
    }
    let mut stored = [0u8; 32];
    stored.copy_from_slice(&key[1..]);
    Ok(Hash256::from_stored(stored))
}

// Values are narrowed the same way Bitcoin Core narrows them when deserializing into the
// fixed-width fields of `CDiskBlockIndex`.
fn decode_value(hash: Hash256, value: &[u8]) -> Result<BlockIndexEntry> {
    let mut cursor = ByteCursor::new(value);

    let version = cursor.read_var_int()? as i32;
    let height = cursor.read_var_int()? as i32;
    let status = BlockStatus::from(cursor.read_var_int()? as u32);
    let tx_count = cursor.read_var_int()? as u32;

    let file_number = if status.have_any() {
        cursor.read_var_int()? as i32
    } else {
        0
    };
    let data_pos = if status.have_data() {
        cursor.read_var_int()? as u32
    } else {
        0
    };
    let undo_pos = if status.have_undo() {
        cursor.read_var_int()? as u32
    } else {
        0
    };

    let block_version = cursor.read_i32_be("block version")?;
    let previous_hash = cursor.read_hash("previous block hash")?;
    let merkle_root = cursor.read_hash("merkle root")?;
    let time = cursor.read_u32_be("time")?;
    let bits = cursor.read_u32_be("bits")?;
    let nonce = cursor.read_u32_be("nonce")?;

    if !cursor.is_empty() {
        tracing::trace!(
            "Block index record {hash} has {} trailing bytes",
            cursor.remaining()
        );
    }

    Ok(BlockIndexEntry {
        hash,
        version,
        height,
        status,
        tx_count,
        file_number,
        data_pos,
        undo_pos,
        block_version,
        previous_hash,
        merkle_root,
        time,
        bits,
        nonce,
    })
}

/// Decodes every `b` record of the block index, in key order.
///
/// The result is unordered with respect to height and contains forked and header-only entries.
pub fn list_block_index_entries<S>(store: &S) -> Result<Vec<BlockIndexEntry>>
where
    S: KeyValueStore + ?Sized,
{
    let entries = store
        .iter_prefix(&[BLOCK_INDEX_PREFIX])
        .map(|item| item.and_then(|(key, value)| BlockIndexEntry::decode(&key, &value)))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Decoded {} block index entries", entries.len());

    Ok(entries)
}
