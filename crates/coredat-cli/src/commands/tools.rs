use crate::error::Result;
use coredat::Hash256;

/// Utilities
#[derive(Debug, clap::Subcommand)]
pub enum Tools {
    /// Reverse the byte order of a 32-byte hash.
    ///
    /// Bitcoin tools display hashes reversed compared to how they are serialized on disk.
    /// This command converts between the two forms, e.g. to find a hash in a hex dump of the
    /// block index.
    #[command(name = "revert-hash")]
    RevertHash {
        #[arg(index = 1)]
        hash: String,
    },
}

fn revert_hash(hash: &str) -> Result<String> {
    let hash = hash.strip_prefix("0x").unwrap_or(hash);
    Ok(Hash256::from_hex(hash)?.reversed().to_hex())
}

impl Tools {
    pub fn run(&self) -> Result<()> {
        match self {
            Self::RevertHash { hash } => {
                println!("Reverted: {}", revert_hash(hash)?);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_hash() {
        assert_eq!(
            revert_hash("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b").unwrap(),
            "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a".to_string()
        );
        assert_eq!(
            revert_hash("0x3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a")
                .unwrap(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b".to_string()
        );
        assert!(revert_hash("4a5e").is_err());
    }
}
