//! Logging setup for the tally binary.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::log::LogArgs;

/// Build the log filter.
///
/// Precedence:
/// 1. `--quiet` shows errors only
/// 2. Otherwise `RUST_LOG` if set, else a level derived from `-v` count
/// 3. Directives from `--log.filter` are added on top
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }

    filter
}

/// Install the global log subscriber. Logs go to stderr.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(args))
        .with_writer(std::io::stderr)
        .without_time();

    let installed = if args.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|err| eyre!("failed to install log subscriber: {err}"))
}
