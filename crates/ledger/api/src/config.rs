//! Configuration trait for the usage ledger.
//!
//! Following the same pattern as the rest of the workspace:
//! - The trait defines *what* configuration is needed
//! - CLI args implement the trait directly (no intermediate structs)
//! - The ledger receives `impl LedgerConfig` and extracts what it needs

use tally_primitives::{Amount, BillingCategory, SettlementPolicy};

/// Configuration for rate conversion and settlement.
///
/// # Defaults
///
/// - Primary rate: 100 per unit
/// - Secondary rate: 200 per unit
/// - Rates mutable by the administrator
/// - Settlement policy: skip
#[auto_impl::auto_impl(&, Arc)]
pub trait LedgerConfig {
    /// Amount charged per unit of primary usage.
    fn primary_rate(&self) -> Amount;

    /// Amount charged per unit of secondary usage.
    fn secondary_rate(&self) -> Amount;

    /// Whether the administrator may change rates after construction.
    fn mutable_rates(&self) -> bool;

    /// How settlement treats entities with nothing to settle.
    fn settlement_policy(&self) -> SettlementPolicy;

    /// The initial rate for `category`.
    fn rate(&self, category: BillingCategory) -> Amount {
        match category {
            BillingCategory::Primary => self.primary_rate(),
            BillingCategory::Secondary => self.secondary_rate(),
        }
    }
}
