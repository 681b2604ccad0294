//! Default ledger configuration.

use tally_api::LedgerConfig;
use tally_primitives::{Amount, SettlementPolicy, U256};

use crate::constants::*;

/// Default ledger configuration: rates 100/200, mutable, skip policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLedgerConfig;

impl LedgerConfig for DefaultLedgerConfig {
    fn primary_rate(&self) -> Amount {
        U256::from(DEFAULT_PRIMARY_RATE)
    }

    fn secondary_rate(&self) -> Amount {
        U256::from(DEFAULT_SECONDARY_RATE)
    }

    fn mutable_rates(&self) -> bool {
        DEFAULT_MUTABLE_RATES
    }

    fn settlement_policy(&self) -> SettlementPolicy {
        SettlementPolicy::default()
    }
}
