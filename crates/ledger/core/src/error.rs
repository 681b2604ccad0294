//! Ledger error types.

use tally_api::RailError;
use tally_primitives::{Address, BillingCategory, EntityId, Epoch};

use crate::access::Role;

/// Errors that can occur during ledger operations.
///
/// Every error aborts the call that produced it. Report calls fail before any
/// mutation is committed; settlement only fails on structurally invalid input,
/// strict-policy preconditions, arithmetic overflow or collaborator failure.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Caller does not hold the role the operation requires.
    #[error("{caller} is not the {role}")]
    Unauthorized { caller: Address, role: Role },

    /// A role was assigned the zero address.
    #[error("zero address is not a valid identity")]
    ZeroAddress,

    /// A conversion rate of zero was supplied.
    #[error("{category} rate must be non-zero")]
    InvalidRate { category: BillingCategory },

    /// Rates are fixed for the ledger's lifetime.
    #[error("rates are immutable")]
    RatesImmutable,

    /// Epoch is zero, already reported, or earlier than the last report.
    #[error("invalid epoch {epoch} for {entity} (last reported {max_reported})")]
    InvalidEpoch {
        entity: EntityId,
        epoch: Epoch,
        max_reported: Epoch,
    },

    /// Batch arrays have mismatched lengths.
    #[error(
        "batch length mismatch: entities={entities} epochs={epochs} primary={primary} secondary={secondary}"
    )]
    InvalidUsageAmount {
        entities: usize,
        epochs: usize,
        primary: usize,
        secondary: usize,
    },

    /// Entity has never reported usage (strict settlement only).
    #[error("{0} has never reported usage")]
    NotInitialized(EntityId),

    /// Entity has no accumulated amount in the category (strict settlement only).
    #[error("{entity} has nothing to settle for {category}")]
    NothingToSettle {
        entity: EntityId,
        category: BillingCategory,
    },

    /// Converting or accumulating an amount would overflow.
    #[error("amount overflow for {entity} ({category})")]
    Overflow {
        entity: EntityId,
        category: BillingCategory,
    },

    /// The payment collaborator failed.
    #[error(transparent)]
    Rail(#[from] RailError),
}

/// Errors returned through a [`LedgerHandle`](crate::LedgerHandle).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The ledger service has stopped.
    #[error("ledger service stopped")]
    ServiceStopped,

    /// The ledger rejected the call.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
