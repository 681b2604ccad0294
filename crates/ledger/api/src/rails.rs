//! Payment rail collaborator.
//!
//! The ledger consumes the external payment system only through this narrow
//! interface. It looks up the rail for an (entity, category) pair, asks how
//! much may currently be drawn from it, and requests that a bounded amount be
//! applied. All calls are synchronous: they block the enclosing ledger call
//! until they return or fail.

use tally_primitives::{Amount, BillingCategory, EntityId, RailId};

/// Error type for payment collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum RailError {
    /// The collaborator refused the request.
    #[error("rail rejected request for {entity} ({category}): {reason}")]
    Rejected {
        /// The entity the request was for.
        entity: EntityId,
        /// The billing category of the rail.
        category: BillingCategory,
        /// Description of the refusal.
        reason: String,
    },

    /// The given rail is not known to the collaborator.
    #[error("unknown {0}")]
    UnknownRail(RailId),

    /// The entity has no rail to act on.
    #[error("no {category} rail configured for {entity}")]
    NoRail {
        /// The entity that was looked up.
        entity: EntityId,
        /// The billing category that was looked up.
        category: BillingCategory,
    },

    /// The collaborator reported accepting more than was requested.
    #[error("rail accepted {accepted}, more than the requested {requested}")]
    OverAccepted {
        /// Amount the ledger asked to apply.
        requested: Amount,
        /// Amount the collaborator claims to have applied.
        accepted: Amount,
    },

    /// The collaborator could not be reached.
    #[error("payment collaborator unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// The external payment system, as seen by the settlement engine.
///
/// Implementations own their own lockup accounting. The ledger only trusts the
/// ceiling they report at call time and the amount they report as applied.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait PaymentRails: Send + Sync + 'static {
    /// Look up the rail funding `entity` in `category`.
    ///
    /// Returns `Ok(None)` when no rail is configured.
    fn rail_id(
        &self,
        entity: EntityId,
        category: BillingCategory,
    ) -> Result<Option<RailId>, RailError>;

    /// The amount currently available to settle against `rail`.
    fn lockup_limit(&self, rail: RailId) -> Result<Amount, RailError>;

    /// Apply `amount` against the entity's `category` rail.
    ///
    /// Returns the amount actually accepted, which must not exceed `amount`.
    fn apply(
        &self,
        entity: EntityId,
        amount: Amount,
        category: BillingCategory,
    ) -> Result<Amount, RailError>;

    /// Terminate the entity's primary-category rail.
    fn terminate(&self, entity: EntityId) -> Result<(), RailError>;

    /// Human-readable name for logging and debugging.
    fn name(&self) -> &'static str {
        "rails"
    }
}
