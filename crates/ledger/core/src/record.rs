//! Per-entity usage records.
//!
//! A record starts at all-zero defaults the first time an entity is seen and
//! is never removed. "Initialized" means at least one report was accepted
//! (`max_reported_epoch > 0`).
//!
//! # Invariants
//!
//! - `max_reported_epoch` strictly increases on every accepted report
//! - each category's `last_settled_epoch <= max_reported_epoch`
//! - accumulators grow only on report and shrink only by the exact amount
//!   the payment collaborator accepted
//! - settling one category never touches the other

use serde::{Deserialize, Serialize};
use tally_primitives::{Amount, BillingCategory, Epoch, U256};

/// Unsettled amount and settlement progress for one billing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryBalance {
    accumulated: Amount,
    last_settled_epoch: Epoch,
    /// First epoch of a remainder left by a partial settlement, `0` if none.
    remainder_from_epoch: Epoch,
}

impl CategoryBalance {
    /// Billable amount accrued and not yet settled.
    pub fn accumulated(&self) -> Amount {
        self.accumulated
    }

    /// High-water mark of the last epoch range settled.
    pub fn last_settled_epoch(&self) -> Epoch {
        self.last_settled_epoch
    }

    /// First epoch whose amount is still (partially) unsettled after a
    /// partial settlement, if any.
    pub fn remainder_from_epoch(&self) -> Option<Epoch> {
        (self.remainder_from_epoch != 0).then_some(self.remainder_from_epoch)
    }
}

/// Accumulated usage for a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageRecord {
    primary: CategoryBalance,
    secondary: CategoryBalance,
    max_reported_epoch: Epoch,
}

impl UsageRecord {
    /// Whether any usage has ever been reported.
    pub fn is_initialized(&self) -> bool {
        self.max_reported_epoch > 0
    }

    /// Highest epoch for which usage has been recorded, `0` if none.
    pub fn max_reported_epoch(&self) -> Epoch {
        self.max_reported_epoch
    }

    /// Balance for `category`.
    pub fn balance(&self, category: BillingCategory) -> &CategoryBalance {
        match category {
            BillingCategory::Primary => &self.primary,
            BillingCategory::Secondary => &self.secondary,
        }
    }

    /// Unsettled amount for `category`.
    pub fn accumulated(&self, category: BillingCategory) -> Amount {
        self.balance(category).accumulated
    }

    /// Last settled epoch for `category`.
    pub fn last_settled_epoch(&self, category: BillingCategory) -> Epoch {
        self.balance(category).last_settled_epoch
    }

    /// Unsettled primary amount.
    pub fn primary_accumulated(&self) -> Amount {
        self.primary.accumulated
    }

    /// Unsettled secondary amount.
    pub fn secondary_accumulated(&self) -> Amount {
        self.secondary.accumulated
    }

    /// Last settled primary epoch.
    pub fn last_primary_settled_epoch(&self) -> Epoch {
        self.primary.last_settled_epoch
    }

    /// Last settled secondary epoch.
    pub fn last_secondary_settled_epoch(&self) -> Epoch {
        self.secondary.last_settled_epoch
    }

    fn balance_mut(&mut self, category: BillingCategory) -> &mut CategoryBalance {
        match category {
            BillingCategory::Primary => &mut self.primary,
            BillingCategory::Secondary => &mut self.secondary,
        }
    }

    /// Add converted amounts and advance the reported high-water mark.
    ///
    /// On overflow the record is left untouched and the overflowing category
    /// is returned.
    pub(crate) fn accumulate(
        &mut self,
        epoch: Epoch,
        primary: Amount,
        secondary: Amount,
    ) -> Result<(), BillingCategory> {
        let next_primary = self
            .primary
            .accumulated
            .checked_add(primary)
            .ok_or(BillingCategory::Primary)?;
        let next_secondary = self
            .secondary
            .accumulated
            .checked_add(secondary)
            .ok_or(BillingCategory::Secondary)?;

        self.primary.accumulated = next_primary;
        self.secondary.accumulated = next_secondary;
        self.max_reported_epoch = epoch;
        Ok(())
    }

    /// The epoch range the next settlement of `category` covers.
    ///
    /// Starts at the remainder of an earlier partial settlement if there is
    /// one, otherwise right after the last settled epoch.
    pub fn pending_range(&self, category: BillingCategory) -> (Epoch, Epoch) {
        let balance = self.balance(category);
        let from = balance
            .remainder_from_epoch()
            .unwrap_or_else(|| balance.last_settled_epoch.saturating_add(1))
            .min(self.max_reported_epoch);
        (from, self.max_reported_epoch)
    }

    /// Deduct a settled amount and advance the settled epoch.
    ///
    /// `amount` must not exceed the accumulated amount. Returns the epoch range
    /// covered.
    pub(crate) fn settle(&mut self, category: BillingCategory, amount: Amount) -> (Epoch, Epoch) {
        let (from, to) = self.pending_range(category);
        let balance = self.balance_mut(category);

        balance.accumulated = balance.accumulated.saturating_sub(amount);
        balance.last_settled_epoch = to;
        balance.remainder_from_epoch = if balance.accumulated == U256::ZERO { 0 } else { from };

        (from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(value: u64) -> Amount {
        U256::from(value)
    }

    #[test]
    fn test_default_uninitialized() {
        let record = UsageRecord::default();
        assert!(!record.is_initialized());
        assert_eq!(record.primary_accumulated(), U256::ZERO);
        assert_eq!(record.last_secondary_settled_epoch(), 0);
    }

    #[test]
    fn test_accumulate() {
        let mut record = UsageRecord::default();
        record.accumulate(1, amount(100), amount(200)).expect("no overflow");
        record.accumulate(2, amount(50), amount(0)).expect("no overflow");

        assert!(record.is_initialized());
        assert_eq!(record.max_reported_epoch(), 2);
        assert_eq!(record.primary_accumulated(), amount(150));
        assert_eq!(record.secondary_accumulated(), amount(200));
    }

    #[test]
    fn test_accumulate_overflow_leaves_record_untouched() {
        let mut record = UsageRecord::default();
        record.accumulate(1, amount(1), U256::MAX).expect("no overflow");
        let before = record;

        assert_eq!(record.accumulate(2, amount(1), amount(1)), Err(BillingCategory::Secondary));
        assert_eq!(record, before);
    }

    #[test]
    fn test_full_settle() {
        let mut record = UsageRecord::default();
        record.accumulate(1, amount(100), amount(100)).expect("no overflow");
        record.accumulate(2, amount(200), amount(200)).expect("no overflow");

        let range = record.settle(BillingCategory::Primary, amount(300));
        assert_eq!(range, (1, 2));
        assert_eq!(record.primary_accumulated(), U256::ZERO);
        assert_eq!(record.last_primary_settled_epoch(), 2);
        assert_eq!(record.balance(BillingCategory::Primary).remainder_from_epoch(), None);

        // Secondary untouched
        assert_eq!(record.secondary_accumulated(), amount(300));
        assert_eq!(record.last_secondary_settled_epoch(), 0);
    }

    #[test]
    fn test_partial_settle_keeps_remainder_range() {
        let mut record = UsageRecord::default();
        record.accumulate(1, amount(100), amount(0)).expect("no overflow");

        assert_eq!(record.settle(BillingCategory::Primary, amount(40)), (1, 1));
        assert_eq!(record.primary_accumulated(), amount(60));
        assert_eq!(record.balance(BillingCategory::Primary).remainder_from_epoch(), Some(1));

        // Remainder-only settlement covers the same range again
        assert_eq!(record.pending_range(BillingCategory::Primary), (1, 1));

        record.accumulate(2, amount(10), amount(0)).expect("no overflow");
        assert_eq!(record.settle(BillingCategory::Primary, amount(70)), (1, 2));
        assert_eq!(record.primary_accumulated(), U256::ZERO);
        assert_eq!(record.pending_range(BillingCategory::Primary), (2, 2));
    }

    #[test]
    fn test_remainder_at_last_epoch() {
        let mut record = UsageRecord::default();
        record.accumulate(Epoch::MAX, amount(100), amount(0)).expect("no overflow");

        assert_eq!(record.settle(BillingCategory::Primary, amount(50)), (1, Epoch::MAX));
        assert_eq!(record.last_primary_settled_epoch(), Epoch::MAX);
        assert_eq!(record.pending_range(BillingCategory::Primary), (1, Epoch::MAX));

        assert_eq!(record.settle(BillingCategory::Primary, amount(50)), (1, Epoch::MAX));
        assert_eq!(record.primary_accumulated(), U256::ZERO);
        assert_eq!(record.pending_range(BillingCategory::Primary), (Epoch::MAX, Epoch::MAX));
    }
}
