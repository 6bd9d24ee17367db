use std::io;

use anyhow::{Context, Result};
use log::LevelFilter;
use pix_ledger::engine::{Ledger, LedgerConfig};
use pix_ledger::shell::Shell;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    // RUST_LOG overrides the level; stderr keeps stdout for the console
    SimpleLogger::new()
        .with_level(LevelFilter::Error)
        .env()
        .init()?;

    log::debug!("Application started");

    let config = LedgerConfig::from_env().context("reading ledger configuration")?;
    log::debug!("Loaded configuration: {config:?}");

    let ledger = Ledger::new(config).context("building ledger")?;
    log::debug!("Ledger ready with {} accounts", ledger.directory().len()?);

    let stdin = io::stdin();
    let mut shell = Shell::new(&ledger, stdin.lock(), io::stdout().lock());
    shell.run()?;

    log::debug!("Application finished");

    Ok(())
}
