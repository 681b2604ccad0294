//! CLI arguments for ledger configuration.

use clap::Args;
use serde::{Deserialize, Serialize};
use tally_api::LedgerConfig;
use tally_primitives::{Amount, SettlementPolicy, U256};

use crate::constants::*;

/// CLI wrapper for [`SettlementPolicy`] with clap integration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SettlementPolicyArg {
    /// Skip entities with nothing to settle (default).
    #[default]
    Skip,
    /// Fail the call when any entity has nothing to settle.
    Strict,
}

impl From<SettlementPolicyArg> for SettlementPolicy {
    fn from(arg: SettlementPolicyArg) -> Self {
        match arg {
            SettlementPolicyArg::Skip => SettlementPolicy::Skip,
            SettlementPolicyArg::Strict => SettlementPolicy::Strict,
        }
    }
}

impl From<SettlementPolicy> for SettlementPolicyArg {
    fn from(policy: SettlementPolicy) -> Self {
        match policy {
            SettlementPolicy::Skip => SettlementPolicyArg::Skip,
            SettlementPolicy::Strict => SettlementPolicyArg::Strict,
        }
    }
}

/// Usage ledger CLI arguments. Rates are amounts per usage unit.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Ledger")]
#[serde(default)]
pub struct LedgerArgs {
    /// Amount charged per unit of primary usage
    #[arg(long = "ledger.primary-rate", default_value_t = DEFAULT_PRIMARY_RATE)]
    pub primary_rate: u64,

    /// Amount charged per unit of secondary usage
    #[arg(long = "ledger.secondary-rate", default_value_t = DEFAULT_SECONDARY_RATE)]
    pub secondary_rate: u64,

    /// Fix rates for the ledger's lifetime (reject administrator rate changes)
    #[arg(long = "ledger.fixed-rates")]
    pub fixed_rates: bool,

    /// How settlement treats entities with nothing to settle
    #[arg(long = "ledger.settlement-policy", value_enum, default_value_t = SettlementPolicyArg::Skip)]
    pub settlement_policy: SettlementPolicyArg,
}

impl Default for LedgerArgs {
    fn default() -> Self {
        Self {
            primary_rate: DEFAULT_PRIMARY_RATE,
            secondary_rate: DEFAULT_SECONDARY_RATE,
            fixed_rates: !DEFAULT_MUTABLE_RATES,
            settlement_policy: SettlementPolicyArg::default(),
        }
    }
}

impl LedgerArgs {
    /// Validate argument values.
    pub fn validate(&self) -> Result<(), String> {
        if self.primary_rate == 0 {
            return Err("ledger.primary-rate must be non-zero".to_string());
        }
        if self.secondary_rate == 0 {
            return Err("ledger.secondary-rate must be non-zero".to_string());
        }
        Ok(())
    }
}

impl LedgerConfig for LedgerArgs {
    fn primary_rate(&self) -> Amount {
        U256::from(self.primary_rate)
    }

    fn secondary_rate(&self) -> Amount {
        U256::from(self.secondary_rate)
    }

    fn mutable_rates(&self) -> bool {
        !self.fixed_rates
    }

    fn settlement_policy(&self) -> SettlementPolicy {
        self.settlement_policy.into()
    }
}
