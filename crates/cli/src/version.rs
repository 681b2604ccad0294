//! Version information for the tally binary.

/// The version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name and version, as printed in log banners.
pub const NAME_VERSION: &str = concat!("tally/v", env!("CARGO_PKG_VERSION"));
