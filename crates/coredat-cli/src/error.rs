use coredat::Hash256;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Coredat(#[from] coredat::Error),

    #[error("No data directory given and $HOME is not set, use --datadir")]
    NoDatadir,

    #[error("No block at height {0} in the main chain")]
    HeightNotFound(i32),

    #[error("Block {0} not found in the block index")]
    BlockNotFound(Hash256),

    #[error("Failed to decode the header of block {hash}: {source}")]
    DecodeHeader {
        hash: Hash256,
        #[source]
        source: bitcoin::consensus::encode::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
