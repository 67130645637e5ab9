//! Command-line interface definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rewrite embedded asset references in stored HTML content.
///
/// Exit Codes:
///   0  - Command succeeded (for `validate`: every reference resolves)
///   1  - Rewrite failed; nothing is written to stdout
#[derive(Parser)]
#[command(name = "asset-refs")]
#[command(about = "Rewrite embedded asset references in HTML content", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/asset-refs/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every visited reference
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Asset manifest; falls back to `store_manifest` from the config
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Content file, `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render `<img>` references as full picture markup
    Render {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Replace live asset ids with portable paths
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Write the ledger of exported assets to this file
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Replace portable paths with live asset ids
    Import {
        #[command(flatten)]
        input: InputArgs,

        /// Ledger written by `export`; only its paths are rewritten
        #[arg(long)]
        references: PathBuf,
    },

    /// Check that every referenced asset exists
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Commands {
    pub fn input(&self) -> &InputArgs {
        match self {
            Commands::Render { input }
            | Commands::Export { input, .. }
            | Commands::Import { input, .. }
            | Commands::Validate { input } => input,
        }
    }
}
