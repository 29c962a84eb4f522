//! # coredat
//!
//! Command line tool for inspecting the block index, block files and transaction index of a
//! Bitcoin Core data directory. The node must not be running, Bitcoin Core keeps its
//! databases locked while it is.

mod cli;
mod commands;
mod error;

fn main() -> error::Result<()> {
    cli::run()
}
