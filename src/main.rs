//! Mirrorproc CLI: run a command once per file of a tree into a mirrored destination.

use anyhow::Result;
use clap::Parser;
use mirrorproc::engine::arg_parser::Cli;
use mirrorproc::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
