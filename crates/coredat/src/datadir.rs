use crate::block_file::BlockDataFileReader;
use crate::chain::{MainChain, MainChainReconstructor, TipSelector};
use crate::store::RocksdbStore;
use crate::tx_index::{TransactionIndexEntry, TransactionIndexReader, TxidQuery};
use crate::{BlockIndexEntry, Result};
use std::path::PathBuf;

/// Network whose data is read, selecting the sub directory of the data directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
    /// Bitcoin mainnet.
    #[default]
    Mainnet,
    /// Bitcoin testnet3.
    Testnet,
    /// Bitcoin testnet4.
    Testnet4,
    /// Bitcoin signet.
    Signet,
    /// Bitcoin regtest.
    Regtest,
}

impl Network {
    /// Returns the sub directory Bitcoin Core uses for this network.
    pub fn data_subdir(&self) -> &'static str {
        match self {
            Self::Mainnet => "",
            Self::Testnet => "testnet3",
            Self::Testnet4 => "testnet4",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }
}

/// Reader of the data directory of a Bitcoin Core node.
///
/// ```text
/// <datadir>/<network>/blocks/index/       block index
/// <datadir>/<network>/blocks/blk?????.dat block data
/// <datadir>/<network>/blocks/rev?????.dat undo data
/// <datadir>/<network>/indexes/txindex/    transaction index, if `-txindex` is enabled
/// ```
///
/// Stores are opened read-only for the duration of each call. Bitcoin Core holds an exclusive
/// lock on them while running, so the node must be stopped or the directories copied.
#[derive(Debug, Clone)]
pub struct BitcoinDat {
    datadir: PathBuf,
    network: Network,
    blocks_dir: Option<PathBuf>,
    block_index_dir: Option<PathBuf>,
    txindex_dir: Option<PathBuf>,
}

impl BitcoinDat {
    /// Constructs a new instance of [`BitcoinDat`] for the mainnet data in `datadir`.
    pub fn new(datadir: impl Into<PathBuf>) -> Self {
        Self {
            datadir: datadir.into(),
            network: Network::Mainnet,
            blocks_dir: None,
            block_index_dir: None,
            txindex_dir: None,
        }
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Overrides the location of the block files, as `-blocksdir` does.
    pub fn with_blocks_dir(mut self, blocks_dir: impl Into<PathBuf>) -> Self {
        self.blocks_dir = Some(blocks_dir.into());
        self
    }

    pub fn with_block_index_dir(mut self, block_index_dir: impl Into<PathBuf>) -> Self {
        self.block_index_dir = Some(block_index_dir.into());
        self
    }

    pub fn with_txindex_dir(mut self, txindex_dir: impl Into<PathBuf>) -> Self {
        self.txindex_dir = Some(txindex_dir.into());
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Returns the directory holding the data of the selected network.
    pub fn network_dir(&self) -> PathBuf {
        match self.network.data_subdir() {
            "" => self.datadir.clone(),
            subdir => self.datadir.join(subdir),
        }
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.blocks_dir
            .clone()
            .unwrap_or_else(|| self.network_dir().join("blocks"))
    }

    pub fn block_index_dir(&self) -> PathBuf {
        self.block_index_dir
            .clone()
            .unwrap_or_else(|| self.network_dir().join("blocks").join("index"))
    }

    pub fn txindex_dir(&self) -> PathBuf {
        self.txindex_dir
            .clone()
            .unwrap_or_else(|| self.network_dir().join("indexes").join("txindex"))
    }

    /// Decodes all entries of the block index.
    pub fn block_index_entries(&self) -> Result<Vec<BlockIndexEntry>> {
        let store = RocksdbStore::open_read_only(&self.block_index_dir())?;
        let entries = crate::list_block_index_entries(&store)?;
        store.close();
        Ok(entries)
    }

    /// Reconstructs the main chain from the block index.
    pub fn main_chain(&self) -> Result<MainChain> {
        self.main_chain_with(MainChainReconstructor::new())
    }

    /// Reconstructs the main chain from the block index using a custom tip policy.
    pub fn main_chain_with<T: TipSelector>(
        &self,
        reconstructor: MainChainReconstructor<T>,
    ) -> Result<MainChain> {
        let entries = self.block_index_entries()?;
        let chain = reconstructor.reconstruct(&entries)?;

        if let Some(tip) = chain.tip() {
            tracing::info!(
                "Main chain in {} has {} blocks, tip: #{},{}",
                self.network_dir().display(),
                chain.len(),
                tip.height,
                tip.hash
            );
        }

        Ok(chain)
    }

    pub fn block_file_reader(&self) -> BlockDataFileReader {
        BlockDataFileReader::new(self.blocks_dir())
    }

    /// Reads the serialized block of `entry`.
    pub fn read_block_data(&self, entry: &BlockIndexEntry) -> Result<Vec<u8>> {
        self.block_file_reader().read_block_bytes(entry)
    }

    /// Reads the serialized undo data of `entry`.
    pub fn read_undo_data(&self, entry: &BlockIndexEntry) -> Result<Vec<u8>> {
        self.block_file_reader().read_undo_bytes(entry)
    }

    /// Opens the transaction index, kept open until the reader is closed or dropped.
    pub fn open_transaction_index_reader(&self) -> Result<TransactionIndexReader> {
        TransactionIndexReader::open(&self.txindex_dir())
    }

    /// Looks up the location of a transaction in the transaction index.
    pub fn lookup_transaction<'a>(
        &self,
        txid: impl Into<TxidQuery<'a>>,
    ) -> Result<TransactionIndexEntry> {
        // Resolve first so that a malformed txid never opens the store.
        let txid = txid.into().resolve()?;
        let reader = self.open_transaction_index_reader()?;
        let entry = reader.read(txid);
        reader.close();
        entry
    }
}
