use crate::error::{Error, Result};
use bitcoin::block::Header;
use clap::ArgGroup;
use coredat::{BitcoinDat, BlockIndexEntry, Hash256, MainChain};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
#[command(group(ArgGroup::new("block").required(true).args(["height", "hash"])))]
pub struct ReadBlockCmd {
    /// Height of the block in the main chain.
    #[arg(long)]
    height: Option<i32>,

    /// Hash of the block, any entry of the block index including stale ones.
    #[arg(long)]
    hash: Option<String>,

    /// Write the raw bytes to a file instead of printing them as hex.
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Read the undo data of the block instead of the block.
    #[arg(long)]
    undo: bool,
}

impl ReadBlockCmd {
    pub fn execute(&self, dat: &BitcoinDat) -> Result<()> {
        let entry = self.find_entry(dat)?;

        let bytes = if self.undo {
            dat.read_undo_data(&entry)?
        } else {
            let bytes = dat.read_block_data(&entry)?;
            check_header(&entry, &bytes)?;
            bytes
        };

        tracing::info!(
            "Read {} bytes for block #{},{} from file {}",
            bytes.len(),
            entry.height,
            entry.hash,
            entry.file_number
        );

        match &self.output {
            Some(path) => std::fs::write(path, &bytes).map_err(|source| Error::Output {
                path: path.clone(),
                source,
            })?,
            None => println!("{}", hex::encode(&bytes)),
        }

        Ok(())
    }

    fn find_entry(&self, dat: &BitcoinDat) -> Result<BlockIndexEntry> {
        if let Some(hash) = &self.hash {
            let hash = Hash256::from_hex(hash)?;
            return dat
                .block_index_entries()?
                .into_iter()
                .find(|entry| entry.hash == hash)
                .ok_or(Error::BlockNotFound(hash));
        }

        entry_at_height(&dat.main_chain()?, self.height.unwrap_or_default())
    }
}

fn entry_at_height(chain: &MainChain, height: i32) -> Result<BlockIndexEntry> {
    chain
        .get(height)
        .cloned()
        .ok_or(Error::HeightNotFound(height))
}

/// Checks the header read from the block file against the block index entry.
fn check_header(entry: &BlockIndexEntry, bytes: &[u8]) -> Result<()> {
    let (header, _): (Header, usize) =
        bitcoin::consensus::deserialize_partial(bytes).map_err(|source| Error::DecodeHeader {
            hash: entry.hash,
            source,
        })?;

    let block_hash = Hash256::from(header.block_hash());
    if block_hash == entry.hash {
        tracing::debug!("Header of block #{} matches {block_hash}", entry.height);
    } else {
        tracing::warn!(
            "Header of block #{} hashes to {block_hash}, expected {}",
            entry.height,
            entry.hash
        );
    }

    Ok(())
}
