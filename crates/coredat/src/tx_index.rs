//! Codec of the `t` records of `indexes/txindex`.
//!
//! Key: `t` followed by the txid in stored order. Value: varints file number, position of the
//! block data in that file, offset of the transaction from the start of the block data.

use crate::cursor::{ByteCursor, write_var_int};
use crate::store::{KeyValueStore, RocksdbStore};
use crate::{Error, Hash256, Result};
use std::path::Path;

/// Key tag of transaction index records.
pub const TX_INDEX_PREFIX: u8 = b't';

/// Location of a transaction in the block files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionIndexEntry {
    /// Number of the `blk` file holding the block.
    pub file_number: i32,
    /// Position of the block data in the `blk` file.
    pub block_data_pos: u32,
    /// Byte offset of the transaction, counted after the block header.
    pub tx_offset_within_block: u32,
}

impl TransactionIndexEntry {
    /// Decodes the value of the record of `txid`.
    pub fn decode(txid: Hash256, value: &[u8]) -> Result<Self> {
        let decode = || -> Result<Self> {
            let mut cursor = ByteCursor::new(value);
            Ok(Self {
                file_number: cursor.read_var_int()? as i32,
                block_data_pos: cursor.read_var_int()? as u32,
                tx_offset_within_block: cursor.read_var_int()? as u32,
            })
        };

        decode().map_err(|err| Error::TxIndexRecord {
            txid,
            source: Box::new(err),
        })
    }

    /// Encodes the record value.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        write_var_int(&mut out, self.file_number as u64);
        write_var_int(&mut out, u64::from(self.block_data_pos));
        write_var_int(&mut out, u64::from(self.tx_offset_within_block));
        out
    }
}

/// Returns the store key of the txindex record of `txid`.
pub fn tx_index_key(txid: &Hash256) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = TX_INDEX_PREFIX;
    key[1..].copy_from_slice(&txid.to_stored());
    key
}

/// Transaction id given either as a hash or as 64 hex characters.
#[derive(Debug, Clone, Copy)]
pub enum TxidQuery<'a> {
    Hash(Hash256),
    Hex(&'a str),
}

impl TxidQuery<'_> {
    pub(crate) fn resolve(self) -> Result<Hash256> {
        match self {
            Self::Hash(hash) => Ok(hash),
            Self::Hex(s) => Hash256::from_hex(s),
        }
    }
}

impl From<Hash256> for TxidQuery<'_> {
    fn from(hash: Hash256) -> Self {
        Self::Hash(hash)
    }
}

impl<'a> From<&'a str> for TxidQuery<'a> {
    fn from(s: &'a str) -> Self {
        Self::Hex(s)
    }
}

impl<'a> From<&'a String> for TxidQuery<'a> {
    fn from(s: &'a String) -> Self {
        Self::Hex(s.as_str())
    }
}

/// Looks up the location of a transaction.
///
/// A malformed txid is rejected before the store is touched.
pub fn lookup_transaction<'a, S>(
    store: &S,
    txid: impl Into<TxidQuery<'a>>,
) -> Result<TransactionIndexEntry>
where
    S: KeyValueStore + ?Sized,
{
    let txid = txid.into().resolve()?;

    let value = store
        .get(&tx_index_key(&txid))?
        .ok_or_else(|| Error::NotFound(format!("Transaction {txid}")))?;

    TransactionIndexEntry::decode(txid, &value)
}

/// Reader over an opened `indexes/txindex` store.
///
/// The store is held open until the reader is closed or dropped.
pub struct TransactionIndexReader<S = RocksdbStore> {
    store: S,
}

impl TransactionIndexReader<RocksdbStore> {
    /// Opens the txindex at `path` read-only.
    pub fn open(path: &Path) -> Result<Self> {
        RocksdbStore::open_read_only(path).map(Self::new)
    }

    /// Releases the store.
    pub fn close(self) {
        self.store.close();
    }
}

impl<S: KeyValueStore> TransactionIndexReader<S> {
    /// Wraps an already opened store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the location of `txid`.
    pub fn read(&self, txid: Hash256) -> Result<TransactionIndexEntry> {
        lookup_transaction(&self.store, txid)
    }

    /// Reads the location of the txid given as 64 hex characters.
    pub fn read_txid(&self, txid: &str) -> Result<TransactionIndexEntry> {
        lookup_transaction(&self.store, txid)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
