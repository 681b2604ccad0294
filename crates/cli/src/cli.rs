//! Command-line interface for tally.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_ledger::LedgerArgs;

use crate::log::LogArgs;
use crate::version;

/// Tally - usage accounting with lockup-bounded settlement
#[derive(Debug, Parser)]
#[command(author, version = version::VERSION, about, long_about = None)]
pub struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,

    /// Path to a TOML configuration file.
    #[arg(long, global = true, value_name = "PATH", env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Tally commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a scenario file against an in-memory ledger.
    Replay(ReplayArgs),

    /// Print the merged configuration as TOML.
    Config(ConfigArgs),
}

/// Arguments for the `replay` command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Scenario file (TOML) with rails and steps.
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Log failed steps and continue instead of stopping.
    #[arg(long)]
    pub keep_going: bool,

    /// Ledger configuration.
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

/// Arguments for the `config` command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Ledger configuration.
    #[command(flatten)]
    pub ledger: LedgerArgs,
}
