use crate::error::Result;
use coredat::{BitcoinDat, BlockIndexEntry};

#[derive(Debug, clap::Args)]
pub struct IndexCmd {
    /// Only print the first N entries, ordered by height.
    #[clap(long, value_name = "N")]
    limit: Option<usize>,
}

impl IndexCmd {
    pub fn execute(&self, dat: &BitcoinDat) -> Result<()> {
        let mut entries = dat.block_index_entries()?;
        entries.sort_by(|a, b| a.height.cmp(&b.height).then(a.hash.cmp(&b.hash)));

        tracing::info!("{} entries in the block index", entries.len());

        let limit = self.limit.unwrap_or(entries.len());
        for entry in entries.iter().take(limit) {
            println!("{}", format_entry(entry));
        }

        Ok(())
    }
}

fn format_entry(entry: &BlockIndexEntry) -> String {
    format!(
        "{}\t{}\tstatus={:#x}\tntx={}\tfile={}\tdata_pos={}\tundo_pos={}\ttime={}",
        entry.height,
        entry.hash,
        entry.status.bits(),
        entry.tx_count,
        entry.file_number,
        entry.data_pos,
        entry.undo_pos,
        entry.time,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use coredat::{BlockStatus, Hash256};

    #[test]
    fn test_format_entry() {
        let entry = BlockIndexEntry {
            hash: Hash256::new([0xab; 32]),
            version: 250000,
            height: 7,
            status: BlockStatus::VALID_SCRIPTS | BlockStatus::HAVE_DATA,
            tx_count: 2,
            file_number: 0,
            data_pos: 8,
            undo_pos: 0,
            block_version: 4,
            previous_hash: Hash256::all_zeros(),
            merkle_root: Hash256::all_zeros(),
            time: 1231006505,
            bits: 0x1d00ffff,
            nonce: 0,
        };
        let line = format_entry(&entry);
        assert!(line.starts_with("7\tabab"));
        assert!(line.contains("status=0xd"));
        assert!(line.ends_with("time=1231006505"));
    }
}
