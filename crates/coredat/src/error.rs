//! Error types for reading a Bitcoin Core data directory.

use crate::Hash256;
use std::path::PathBuf;

/// Broad classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed varint, truncated record, wrong-length identifier, unexpected key prefix.
    Format,
    /// Missing or unreadable store or payload file, short read, seek failure.
    Io,
    /// Lookup key absent from the store.
    NotFound,
    /// The block index cannot be assembled into a single chain.
    Consistency,
}

/// Errors that can occur while decoding and reading the node data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read went past the end of the buffer.
    #[error(
        "Unexpected end of data reading {field}: need {wanted} bytes at offset {position}, {available} available"
    )]
    UnexpectedEof {
        field: &'static str,
        position: usize,
        wanted: usize,
        available: usize,
    },

    /// A varint does not fit into 64 bits.
    #[error("Varint starting at offset {position} overflows u64")]
    VarIntOverflow { position: usize },

    /// A store key has the wrong tag or length.
    #[error("Invalid key 0x{key}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// A hash was built from a slice that is not 32 bytes long.
    #[error("Hash256 needs 32 bytes, got {0} bytes")]
    InvalidHashLength(usize),

    /// A hash string is not exactly 64 characters long.
    #[error("Expected a hash string of 64 chars, got {len} for {input:?}")]
    InvalidHexLength { input: String, len: usize },

    /// A hash string contains non-hex characters.
    #[error("Invalid hex {input:?}: {source}")]
    InvalidHex {
        input: String,
        #[source]
        source: hex::FromHexError,
    },

    /// The value of a `b` record could not be decoded.
    #[error("Malformed block index record for {hash}: {source}")]
    BlockIndexRecord {
        hash: Hash256,
        #[source]
        source: Box<Error>,
    },

    /// The value of a `t` record could not be decoded.
    #[error("Malformed txindex record for {txid}: {source}")]
    TxIndexRecord {
        txid: Hash256,
        #[source]
        source: Box<Error>,
    },

    /// The recorded payload position leaves no room for the size prefix.
    #[error("Block {hash} has data position {position}, too small for the size prefix")]
    BadDataPosition { hash: Hash256, position: u32 },

    /// Filesystem failure.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes than required were available in a payload file.
    #[error("Short read in {}: wanted {wanted} bytes at offset {offset}, got {got}", path.display())]
    ShortRead {
        path: PathBuf,
        offset: u64,
        wanted: usize,
        got: usize,
    },

    /// The entry does not have `HAVE_DATA` set.
    #[error("No data available for block {0}")]
    MissingData(Hash256),

    /// The entry does not have `HAVE_UNDO` set.
    #[error("No undo data available for block {0}")]
    MissingUndo(Hash256),

    /// The key-value store could not be opened.
    #[error("Failed to open store at {}: {source}", path.display())]
    OpenStore {
        path: PathBuf,
        #[source]
        source: rocksdb::Error,
    },

    /// RocksDB error.
    #[error("RocksDB error: {0}")]
    Rocksdb(#[from] rocksdb::Error),

    /// Lookup key absent from the store.
    #[error("{0} not found")]
    NotFound(String),

    /// No entry of a fork bucket is the parent of the chain selected so far.
    #[error("No block at height {height} has hash {expected}, the parent of block {child}")]
    MissingParent {
        height: i32,
        expected: Hash256,
        child: Hash256,
    },

    /// The only entry at a height is not the parent of the chain selected so far.
    #[error("Block {hash} at height {height} is not the parent {expected} of block {child}")]
    BrokenLink {
        height: i32,
        hash: Hash256,
        expected: Hash256,
        child: Hash256,
    },

    /// A height between genesis and the tip has no entry at all.
    #[error("No block index entry at height {height}, below block {child}")]
    MissingHeight { height: i32, child: Hash256 },
}

impl Error {
    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedEof { .. }
            | Self::VarIntOverflow { .. }
            | Self::InvalidKey { .. }
            | Self::InvalidHashLength(_)
            | Self::InvalidHexLength { .. }
            | Self::InvalidHex { .. }
            | Self::BlockIndexRecord { .. }
            | Self::TxIndexRecord { .. }
            | Self::BadDataPosition { .. } => ErrorKind::Format,
            Self::Io { .. }
            | Self::ShortRead { .. }
            | Self::MissingData(_)
            | Self::MissingUndo(_)
            | Self::OpenStore { .. }
            | Self::Rocksdb(_) => ErrorKind::Io,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MissingParent { .. } | Self::BrokenLink { .. } | Self::MissingHeight { .. } => {
                ErrorKind::Consistency
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_key(key: &[u8], reason: &'static str) -> Self {
        Self::InvalidKey {
            key: hex::encode(key),
            reason,
        }
    }
}
