//! Usage-to-amount conversion rates.
//!
//! The rate in effect when usage is reported is the one applied; later rate
//! changes never reprice amounts that were already accumulated.

use tally_api::LedgerConfig;
use tally_primitives::{Amount, BillingCategory, Units, U256};

use crate::LedgerError;

/// Per-category conversion rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateTable {
    primary: Amount,
    secondary: Amount,
    mutable: bool,
}

impl RateTable {
    /// Create a rate table. Both rates must be non-zero.
    pub fn new(primary: Amount, secondary: Amount, mutable: bool) -> Result<Self, LedgerError> {
        for (category, rate) in [
            (BillingCategory::Primary, primary),
            (BillingCategory::Secondary, secondary),
        ] {
            if rate.is_zero() {
                return Err(LedgerError::InvalidRate { category });
            }
        }
        Ok(Self { primary, secondary, mutable })
    }

    /// Create a rate table from configuration.
    pub fn from_config(config: &impl LedgerConfig) -> Result<Self, LedgerError> {
        Self::new(
            config.rate(BillingCategory::Primary),
            config.rate(BillingCategory::Secondary),
            config.mutable_rates(),
        )
    }

    /// The current rate for `category`.
    pub fn rate(&self, category: BillingCategory) -> Amount {
        match category {
            BillingCategory::Primary => self.primary,
            BillingCategory::Secondary => self.secondary,
        }
    }

    /// Whether rates may be changed.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Convert `units` of `category` usage at the current rate.
    ///
    /// Returns `None` on overflow.
    pub fn convert(&self, category: BillingCategory, units: Units) -> Option<Amount> {
        U256::from(units).checked_mul(self.rate(category))
    }

    /// Replace the rate for `category`, returning the previous one.
    pub(crate) fn set(
        &mut self,
        category: BillingCategory,
        rate: Amount,
    ) -> Result<Amount, LedgerError> {
        if !self.mutable {
            return Err(LedgerError::RatesImmutable);
        }
        if rate.is_zero() {
            return Err(LedgerError::InvalidRate { category });
        }
        let slot = match category {
            BillingCategory::Primary => &mut self.primary,
            BillingCategory::Secondary => &mut self.secondary,
        };
        Ok(core::mem::replace(slot, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tally_test_utils::TestConfig;

    fn table() -> RateTable {
        RateTable::new(U256::from(100u64), U256::from(200u64), true).expect("non-zero rates")
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert_matches!(
            RateTable::new(U256::ZERO, U256::from(1u64), true),
            Err(LedgerError::InvalidRate { category: BillingCategory::Primary })
        );
        assert_matches!(
            RateTable::new(U256::from(1u64), U256::ZERO, false),
            Err(LedgerError::InvalidRate { category: BillingCategory::Secondary })
        );
    }

    #[test]
    fn test_from_config() {
        let config = TestConfig::new(U256::from(7u64), U256::from(9u64)).with_fixed_rates();
        let rates = RateTable::from_config(&config).expect("non-zero rates");
        assert_eq!(rates.rate(BillingCategory::Primary), U256::from(7u64));
        assert_eq!(rates.rate(BillingCategory::Secondary), U256::from(9u64));
        assert!(!rates.is_mutable());
    }

    #[test]
    fn test_convert() {
        let rates = table();
        assert_eq!(rates.convert(BillingCategory::Primary, 1000), Some(U256::from(100_000u64)));
        assert_eq!(rates.convert(BillingCategory::Secondary, 500), Some(U256::from(100_000u64)));
        assert_eq!(rates.convert(BillingCategory::Primary, 0), Some(U256::ZERO));
    }

    #[test]
    fn test_convert_overflow() {
        let rates = RateTable::new(U256::MAX, U256::from(1u64), true).expect("non-zero rates");
        assert_eq!(rates.convert(BillingCategory::Primary, 2), None);
        assert_eq!(rates.convert(BillingCategory::Primary, 1), Some(U256::MAX));
    }

    #[test]
    fn test_set_rate() {
        let mut rates = table();
        let old = rates.set(BillingCategory::Secondary, U256::from(300u64)).expect("mutable");
        assert_eq!(old, U256::from(200u64));
        assert_eq!(rates.rate(BillingCategory::Secondary), U256::from(300u64));
        assert_eq!(rates.rate(BillingCategory::Primary), U256::from(100u64));

        assert_matches!(
            rates.set(BillingCategory::Primary, U256::ZERO),
            Err(LedgerError::InvalidRate { .. })
        );
    }

    #[test]
    fn test_immutable_rates() {
        let mut rates =
            RateTable::new(U256::from(1u64), U256::from(1u64), false).expect("non-zero rates");
        assert_matches!(
            rates.set(BillingCategory::Primary, U256::from(5u64)),
            Err(LedgerError::RatesImmutable)
        );
    }
}
