use crate::commands::chain::MainChainCmd;
use crate::commands::index::IndexCmd;
use crate::commands::read_block::ReadBlockCmd;
use crate::commands::tools::Tools;
use crate::commands::tx::TxCmd;
use crate::error::{Error, Result};
use clap::Parser;
use coredat::{BitcoinDat, Network};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// Chain.
#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Chain {
    /// Bitcoin mainnet.
    #[default]
    BitcoinMainnet,
    /// Bitcoin testnet3.
    BitcoinTestnet,
    /// Bitcoin testnet4.
    BitcoinTestnet4,
    /// Bitcoin signet.
    BitcoinSignet,
    /// Bitcoin regtest.
    BitcoinRegtest,
}

impl Chain {
    pub fn network(&self) -> Network {
        match self {
            Self::BitcoinMainnet => Network::Mainnet,
            Self::BitcoinTestnet => Network::Testnet,
            Self::BitcoinTestnet4 => Network::Testnet4,
            Self::BitcoinSignet => Network::Signet,
            Self::BitcoinRegtest => Network::Regtest,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List the decoded entries of the block index.
    Index(IndexCmd),

    /// Print the main chain reconstructed from the block index.
    #[command(name = "chain")]
    MainChain(MainChainCmd),

    /// Read the raw data of a block from the block files.
    ReadBlock(ReadBlockCmd),

    /// Look up the location of a transaction in the transaction index.
    Tx(TxCmd),

    #[command(flatten)]
    Tools(Tools),
}

/// Inspect the data directory of a Bitcoin Core node.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,

    /// Specify the Bitcoin Core data directory.
    ///
    /// Defaults to `~/.bitcoin`.
    #[arg(long, short = 'd', value_name = "PATH", global = true)]
    pub datadir: Option<PathBuf>,

    /// Specify the chain.
    #[arg(long, value_name = "CHAIN", default_value = "bitcoin-mainnet", global = true)]
    pub chain: Chain,

    /// Sets a custom logging filter, overridden by `RUST_LOG`.
    #[arg(long, value_name = "FILTER", default_value = "info", global = true)]
    pub log: String,
}

impl App {
    fn bitcoin_dat(&self) -> Result<BitcoinDat> {
        let datadir = match &self.datadir {
            Some(datadir) => datadir.clone(),
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".bitcoin"))
                .ok_or(Error::NoDatadir)?,
        };

        Ok(BitcoinDat::new(datadir).with_network(self.chain.network()))
    }
}

fn init_tracing(log_filter: &str) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Parse and run command line arguments.
pub fn run() -> Result<()> {
    let app = App::parse();

    init_tracing(&app.log);

    match app.command {
        Command::Index(ref cmd) => cmd.execute(&app.bitcoin_dat()?),
        Command::MainChain(ref cmd) => cmd.execute(&app.bitcoin_dat()?),
        Command::ReadBlock(ref cmd) => cmd.execute(&app.bitcoin_dat()?),
        Command::Tx(ref cmd) => cmd.execute(&app.bitcoin_dat()?),
        Command::Tools(ref tools) => tools.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }

    #[test]
    fn parse_global_args_after_subcommand() {
        let app = App::try_parse_from([
            "coredat",
            "chain",
            "--tip-only",
            "--datadir",
            "/data/bitcoin",
            "--chain",
            "bitcoin-regtest",
        ])
        .unwrap();

        assert_eq!(app.chain, Chain::BitcoinRegtest);
        let dat = app.bitcoin_dat().unwrap();
        assert_eq!(dat.network(), Network::Regtest);
        assert_eq!(
            dat.block_index_dir(),
            PathBuf::from("/data/bitcoin/regtest/blocks/index")
        );
        assert!(matches!(app.command, Command::MainChain(_)));
    }

    #[test]
    fn read_block_needs_a_single_selector() {
        assert!(App::try_parse_from(["coredat", "read-block"]).is_err());
        assert!(
            App::try_parse_from(["coredat", "read-block", "--height", "1", "--hash", "00"])
                .is_err()
        );
        assert!(App::try_parse_from(["coredat", "read-block", "--height", "1"]).is_ok());
    }
}
