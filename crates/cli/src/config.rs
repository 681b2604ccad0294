//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`TALLY_` prefix, `__` between sections,
//!    e.g. `TALLY_LEDGER__PRIMARY_RATE=150`)
//! 4. Defaults

use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tally_ledger::{LedgerArgs, Roles};
use tally_primitives::Address;

/// Role holders for a ledger instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Administrator identity.
    pub admin: Address,
    /// Usage reporter identity.
    pub reporter: Address,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self { admin: Address::with_last_byte(0x01), reporter: Address::with_last_byte(0x02) }
    }
}

impl RolesConfig {
    /// Build the ledger's role assignment.
    pub fn roles(&self) -> Result<Roles> {
        Roles::new(self.admin, self.reporter).wrap_err("invalid role configuration")
    }
}

/// Complete tally configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Ledger rates and settlement policy.
    pub ledger: LedgerArgs,

    /// Role holders.
    pub roles: RolesConfig,
}

impl TallyConfig {
    /// Load configuration from defaults, environment, and config file.
    /// A config path that does not exist is an error.
    /// CLI overrides should be applied separately after loading.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(TallyConfig::default()))
            .merge(Env::prefixed("TALLY_").split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(eyre!("Config file {} does not exist", path.display()));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().wrap_err("Failed to load configuration")
    }

    /// Apply CLI ledger arguments that differ from their defaults.
    pub fn apply_cli(&mut self, args: &LedgerArgs) {
        let defaults = LedgerArgs::default();
        if args.primary_rate != defaults.primary_rate {
            self.ledger.primary_rate = args.primary_rate;
        }
        if args.secondary_rate != defaults.secondary_rate {
            self.ledger.secondary_rate = args.secondary_rate;
        }
        if args.fixed_rates {
            self.ledger.fixed_rates = true;
        }
        if args.settlement_policy != defaults.settlement_policy {
            self.ledger.settlement_policy = args.settlement_policy;
        }
    }

    /// Check the merged configuration.
    pub fn validate(&self) -> Result<()> {
        self.ledger.validate().map_err(|msg| eyre!(msg))?;
        self.roles.roles()?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("Failed to serialize configuration")
    }
}

/// Load, override and validate configuration in one step.
pub fn resolve(config_path: Option<&Path>, args: &LedgerArgs) -> Result<TallyConfig> {
    let mut config = TallyConfig::load(config_path)?;
    config.apply_cli(args);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tally_api::LedgerConfig;
    use tally_ledger::SettlementPolicyArg;
    use tally_primitives::{SettlementPolicy, U256};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TallyConfig::default();
        assert_eq!(config.ledger.primary_rate(), U256::from(100u64));
        assert_eq!(config.ledger.secondary_rate(), U256::from(200u64));
        assert!(config.ledger.mutable_rates());
        assert_eq!(config.ledger.settlement_policy(), SettlementPolicy::Skip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("tally.toml");

        fs::write(
            &config_path,
            r#"
[ledger]
primary_rate = 7
settlement_policy = "strict"

[roles]
reporter = "0x00000000000000000000000000000000000000aa"
"#,
        )
        .unwrap();

        let config = TallyConfig::load(Some(&config_path)).unwrap();
        assert_eq!(config.ledger.primary_rate, 7);
        assert_eq!(config.ledger.secondary_rate, 200);
        assert_eq!(config.ledger.settlement_policy, SettlementPolicyArg::Strict);
        assert_eq!(config.roles.reporter, Address::with_last_byte(0xaa));
        assert_eq!(config.roles.admin, RolesConfig::default().admin);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let err = TallyConfig::load(Some(&config_path)).unwrap_err();
        assert!(err.to_string().contains("nonexistent.toml"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = TallyConfig::load(None).unwrap();
        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("tally.toml");
        fs::write(&config_path, "[ledger]\nprimary_rate = 7\nsecondary_rate = 9\n").unwrap();

        let args = LedgerArgs { secondary_rate: 11, fixed_rates: true, ..Default::default() };
        let config = resolve(Some(&config_path), &args).unwrap();

        assert_eq!(config.ledger.primary_rate, 7);
        assert_eq!(config.ledger.secondary_rate, 11);
        assert!(config.ledger.fixed_rates);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("tally.toml");
        fs::write(&config_path, "[ledger]\nprimary_rate = 0\n").unwrap();

        assert!(resolve(Some(&config_path), &LedgerArgs::default()).is_err());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = TallyConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[ledger]"));
        assert!(rendered.contains("settlement_policy = \"skip\""));

        let parsed: TallyConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
