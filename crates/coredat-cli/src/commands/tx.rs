use crate::error::Result;
use coredat::BitcoinDat;

#[derive(Debug, clap::Args)]
pub struct TxCmd {
    /// Transaction id, 64 hex characters as displayed by Bitcoin tools.
    #[arg(index = 1, value_name = "TXID")]
    txid: String,
}

impl TxCmd {
    pub fn execute(&self, dat: &BitcoinDat) -> Result<()> {
        let location = dat.lookup_transaction(&self.txid)?;

        println!(
            "file={}\tblock_data_pos={}\ttx_offset={}",
            location.file_number, location.block_data_pos, location.tx_offset_within_block
        );

        Ok(())
    }
}
