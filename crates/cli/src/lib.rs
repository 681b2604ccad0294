//! Command-line interface for the tally usage ledger.
//!
//! This crate provides:
//! - [`Cli`] - Top-level CLI parser
//! - [`Commands`] - Available subcommands
//! - [`TallyConfig`] - Merged configuration
//! - [`logging::init_logging`] - Log subscriber setup
//!
//! Configuration is loaded using Figment with the following priority
//! (highest wins):
//!
//! 1. CLI arguments
//! 2. Config file (TOML)
//! 3. Environment variables (`TALLY_` prefix)
//! 4. Defaults

mod cli;
pub mod commands;
pub mod config;
pub mod log;
pub mod logging;
pub mod scenario;
pub mod version;

pub use cli::{Cli, Commands, ConfigArgs, ReplayArgs};
pub use config::TallyConfig;

use clap::Parser;
use color_eyre::eyre;
use tracing::debug;

/// Run tally with the process's CLI arguments.
///
/// This is the main entry point that should be called from the binary.
pub async fn run() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;
    debug!("Starting {}", version::NAME_VERSION);

    match cli.command {
        Commands::Replay(args) => {
            let config = config::resolve(cli.config.as_deref(), &args.ledger)?;
            commands::replay::run(args, config).await?;
        }
        Commands::Config(args) => {
            let config = config::resolve(cli.config.as_deref(), &args.ledger)?;
            commands::config::run(&config)?;
        }
    }

    Ok(())
}
