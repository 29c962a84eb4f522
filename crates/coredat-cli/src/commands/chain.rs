use crate::error::Result;
use coredat::{BitcoinDat, MainChainReconstructor, PreferValid};

/// Policy for choosing among several entries at the highest height.
#[derive(Clone, Copy, Default, Debug, clap::ValueEnum)]
pub enum TipPolicy {
    /// First entry in key order.
    #[default]
    First,
    /// Skip failed entries, then prefer the highest validity level and stored data.
    PreferValid,
}

#[derive(Debug, clap::Args)]
pub struct MainChainCmd {
    /// Specify how the tip is chosen when the highest height is forked.
    #[clap(long, value_name = "POLICY", default_value = "first")]
    tip_policy: TipPolicy,

    /// Print the tip only.
    #[clap(long)]
    tip_only: bool,
}

impl MainChainCmd {
    pub fn execute(&self, dat: &BitcoinDat) -> Result<()> {
        let chain = match self.tip_policy {
            TipPolicy::First => dat.main_chain()?,
            TipPolicy::PreferValid => {
                dat.main_chain_with(MainChainReconstructor::with_tip_selector(PreferValid))?
            }
        };

        if self.tip_only {
            if let Some(tip) = chain.tip() {
                println!("{}\t{}", tip.height, tip.hash);
            }
            return Ok(());
        }

        for entry in &chain {
            println!("{}\t{}", entry.height, entry.hash);
        }

        Ok(())
    }
}
