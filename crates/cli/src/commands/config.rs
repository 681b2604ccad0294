//! Config command - print the merged configuration.

use eyre::Result;

use crate::config::TallyConfig;

/// Print `config` as TOML on stdout.
pub fn run(config: &TallyConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
