//! Ledger metrics.

use metrics::Counter;

/// Ledger metrics
#[derive(Clone, Debug)]
pub(crate) struct LedgerMetrics {
    /// Number of accepted usage reports (per entity-epoch item)
    pub(crate) reports_total: Counter,
    /// Number of report calls rejected before commit
    pub(crate) reports_rejected_total: Counter,
    /// Number of entity settlements that moved funds
    pub(crate) settlements_total: Counter,
    /// Number of entity settlements that were silently skipped
    pub(crate) settlements_skipped_total: Counter,
    /// Number of terminated entities
    pub(crate) terminations_total: Counter,
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self {
            reports_total: metrics::counter!("ledger.reports_total"),
            reports_rejected_total: metrics::counter!("ledger.reports_rejected_total"),
            settlements_total: metrics::counter!("ledger.settlements_total"),
            settlements_skipped_total: metrics::counter!("ledger.settlements_skipped_total"),
            terminations_total: metrics::counter!("ledger.terminations_total"),
        }
    }
}
