mod cli;
mod commands;

use anyhow::{Context, Result};
use asset_refs_config::Config;
use clap::Parser;
use std::process;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when both are given
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file not found: {}", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };

    if let Some(output) = commands::execute(&cli.command, &config)? {
        print!("{output}");
    }
    Ok(())
}
