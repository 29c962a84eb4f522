//! Reader of the on-disk data of a Bitcoin Core full node.
//!
//! This crate decodes the block index (`blocks/index`), reconstructs the main chain out of its
//! possibly forked entries, reads raw blocks and undo data at the positions recorded in the
//! index, and looks up transaction locations in the optional `indexes/txindex`.
//!
//! ```no_run
//! use coredat::{BitcoinDat, Network};
//!
//! # fn main() -> coredat::Result<()> {
//! let dat = BitcoinDat::new("/home/satoshi/.bitcoin").with_network(Network::Regtest);
//! let chain = dat.main_chain()?;
//! if let Some(tip) = chain.tip() {
//!     let block = dat.read_block_data(tip)?;
//!     println!("Tip #{} {} is {} bytes", tip.height, tip.hash, block.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The stores are LevelDB databases, read through RocksDB which understands their format.

mod block_file;
mod block_index;
mod chain;
mod cursor;
mod datadir;
mod error;
mod hash;
mod status;
pub mod store;
mod tx_index;

pub use self::block_file::{
    BlockDataFileReader, block_file_name, read_block_bytes, undo_file_name,
};
pub use self::block_index::{
    BLOCK_INDEX_PREFIX, BlockIndexEntry, block_index_key, list_block_index_entries,
};
pub use self::chain::{
    FirstCandidate, MainChain, MainChainReconstructor, PreferValid, TipSelector,
    reconstruct_main_chain,
};
pub use self::cursor::{ByteCursor, write_var_int};
pub use self::datadir::{BitcoinDat, Network};
pub use self::error::{Error, ErrorKind};
pub use self::hash::Hash256;
pub use self::status::BlockStatus;
pub use self::tx_index::{
    TX_INDEX_PREFIX, TransactionIndexEntry, TransactionIndexReader, TxidQuery, lookup_transaction,
    tx_index_key,
};

/// Result type of the coredat operations.
pub type Result<T> = std::result::Result<T, Error>;
