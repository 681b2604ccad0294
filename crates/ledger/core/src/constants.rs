//! Default constants for the usage ledger.

/// Default amount charged per unit of primary usage.
pub(crate) const DEFAULT_PRIMARY_RATE: u64 = 100;

/// Default amount charged per unit of secondary usage.
pub(crate) const DEFAULT_SECONDARY_RATE: u64 = 200;

/// Rates are mutable by the administrator unless configured otherwise.
pub(crate) const DEFAULT_MUTABLE_RATES: bool = true;
