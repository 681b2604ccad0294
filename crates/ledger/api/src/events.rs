//! Observable ledger facts.
//!
//! Every state change the ledger commits is published as a [`LedgerEvent`] so
//! an external observer (billing reconciliation, auditing) can replay it.

use core::fmt;

use tally_primitives::{Address, Amount, BillingCategory, EntityId, Epoch, Units};

/// A fact emitted by the ledger after a committed state change.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum LedgerEvent {
    /// Usage was accepted for an entity.
    ///
    /// Carries raw unit counts, not converted amounts.
    UsageReported {
        /// The billed entity.
        entity: EntityId,
        /// First epoch covered (previous high-water mark + 1).
        from_epoch: Epoch,
        /// The reported epoch.
        to_epoch: Epoch,
        /// Primary usage units.
        primary_units: Units,
        /// Secondary usage units.
        secondary_units: Units,
    },

    /// An amount was applied against an entity's rail.
    Settled {
        /// The billed entity.
        entity: EntityId,
        /// The category that was settled.
        category: BillingCategory,
        /// First epoch covered by this settlement.
        from_epoch: Epoch,
        /// Last epoch covered by this settlement.
        to_epoch: Epoch,
        /// Amount actually settled, possibly less than was accumulated.
        amount: Amount,
    },

    /// An entity's primary rail was terminated.
    Terminated {
        /// The terminated entity.
        entity: EntityId,
    },

    /// A conversion rate changed.
    RateUpdated {
        /// The category whose rate changed.
        category: BillingCategory,
        /// Previous rate.
        old: Amount,
        /// New rate.
        new: Amount,
    },

    /// The reporter identity was reassigned.
    ReporterChanged {
        /// Previous reporter.
        old: Address,
        /// New reporter.
        new: Address,
    },

    /// The administrator identity was reassigned.
    AdminChanged {
        /// Previous administrator.
        old: Address,
        /// New administrator.
        new: Address,
    },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageReported { entity, from_epoch, to_epoch, primary_units, secondary_units } => {
                write!(
                    f,
                    "usage {entity} epochs [{from_epoch}, {to_epoch}] primary={primary_units} secondary={secondary_units}"
                )
            }
            Self::Settled { entity, category, from_epoch, to_epoch, amount } => {
                write!(f, "settled {entity} {category} epochs [{from_epoch}, {to_epoch}] amount={amount}")
            }
            Self::Terminated { entity } => write!(f, "terminated {entity}"),
            Self::RateUpdated { category, old, new } => {
                write!(f, "rate {category} {old} -> {new}")
            }
            Self::ReporterChanged { old, new } => write!(f, "reporter {old} -> {new}"),
            Self::AdminChanged { old, new } => write!(f, "admin {old} -> {new}"),
        }
    }
}

/// A consumer of ledger facts.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait EventSink: Send + Sync + 'static {
    /// Handle a committed fact.
    fn emit(&self, event: &LedgerEvent);
}

/// Discards every fact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: &LedgerEvent) {}
}

/// Logs every fact through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::UsageReported { entity, to_epoch, .. } => {
                tracing::debug!(%entity, epoch = to_epoch, %event, "Usage reported");
            }
            LedgerEvent::Settled { entity, category, amount, .. } => {
                tracing::info!(%entity, %category, %amount, "Settled");
            }
            LedgerEvent::Terminated { entity } => {
                tracing::info!(%entity, "Terminated");
            }
            LedgerEvent::RateUpdated { category, old, new } => {
                tracing::info!(%category, %old, %new, "Rate updated");
            }
            LedgerEvent::ReporterChanged { old, new } => {
                tracing::info!(%old, %new, "Reporter changed");
            }
            LedgerEvent::AdminChanged { old, new } => {
                tracing::info!(%old, %new, "Admin changed");
            }
        }
    }
}
