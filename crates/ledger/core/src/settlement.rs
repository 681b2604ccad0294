//! Lockup-bounded settlement.
//!
//! For each entity, settlement draws `min(accumulated, lockup)` from the
//! entity's rail in one category and deducts exactly what the collaborator
//! accepted. Whatever is left stays accumulated and can be collected by a
//! later call once the ceiling rises. Calling again with nothing new reported
//! is a no-op.
//!
//! # Pipeline
//!
//! ```text
//! uninitialized?        -> skip (strict: error)
//! accumulated == 0?     -> skip (strict: error)
//! no rail?              -> skip
//! min(acc, lockup) == 0 -> skip
//! apply -> accepted == 0 -> skip
//! deduct accepted, advance settled epoch, emit fact
//! ```
//!
//! Entities in a batch are independent: a skip for one never affects another.
//! A collaborator failure aborts the call, but entities already settled in it
//! stay settled, because their payments were applied.

use tally_api::{EventSink, LedgerEvent, PaymentRails, RailError};
use tally_primitives::{Amount, BillingCategory, EntityId, Epoch, U256};
use tracing::{debug, trace, warn};

use crate::{LedgerError, UsageLedger};

/// Why an entity was skipped during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The entity has never reported usage.
    Uninitialized,
    /// Nothing is accumulated in the category.
    NothingToSettle,
    /// The collaborator has no rail for the entity and category.
    NoRail,
    /// The rail's lockup ceiling is zero.
    LockupExhausted,
    /// The collaborator accepted nothing.
    Declined,
}

/// Result of settling one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds were applied.
    Settled {
        /// Amount applied, at most the accumulated amount and the lockup.
        amount: Amount,
        /// First epoch covered.
        from_epoch: Epoch,
        /// Last epoch covered.
        to_epoch: Epoch,
        /// Amount still accumulated after this settlement.
        remaining: Amount,
    },
    /// Nothing happened.
    Skipped(SkipReason),
}

impl SettlementOutcome {
    /// Amount applied, zero if skipped.
    pub fn amount(&self) -> Amount {
        match self {
            Self::Settled { amount, .. } => *amount,
            Self::Skipped(_) => U256::ZERO,
        }
    }

    /// Whether funds moved.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

/// Per-entity outcomes of one settlement call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    category: BillingCategory,
    outcomes: Vec<(EntityId, SettlementOutcome)>,
}

impl SettlementReport {
    fn new(category: BillingCategory, capacity: usize) -> Self {
        Self { category, outcomes: Vec::with_capacity(capacity) }
    }

    /// The category that was settled.
    pub fn category(&self) -> BillingCategory {
        self.category
    }

    /// Outcomes in request order.
    pub fn outcomes(&self) -> &[(EntityId, SettlementOutcome)] {
        &self.outcomes
    }

    /// Outcome for `entity` (the last one, if it appeared more than once).
    pub fn outcome(&self, entity: EntityId) -> Option<&SettlementOutcome> {
        self.outcomes.iter().rev().find(|(e, _)| *e == entity).map(|(_, outcome)| outcome)
    }

    /// Sum of all settled amounts.
    pub fn total_settled(&self) -> Amount {
        self.outcomes.iter().fold(U256::ZERO, |acc, (_, outcome)| {
            acc.saturating_add(outcome.amount())
        })
    }

    /// Number of entities that had funds applied.
    pub fn settled_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_settled()).count()
    }
}

impl<R: PaymentRails, E: EventSink> UsageLedger<R, E> {
    /// Settle `category` for each of `entities`. Open to any caller.
    ///
    /// Under the skip policy, entities that are uninitialized or have nothing
    /// accumulated are skipped. Under the strict policy the whole call fails
    /// before any payment is requested. Missing rails and exhausted lockups
    /// are skips under both policies.
    pub fn settle(
        &mut self,
        category: BillingCategory,
        entities: &[EntityId],
    ) -> Result<SettlementReport, LedgerError> {
        if self.policy.is_strict() {
            for &entity in entities {
                self.check_settleable(category, entity)?;
            }
        }

        let mut report = SettlementReport::new(category, entities.len());
        for &entity in entities {
            let outcome = self.settle_entity(category, entity).inspect_err(|err| {
                warn!(%entity, %category, error = %err, "Settlement aborted");
            })?;

            match outcome {
                SettlementOutcome::Settled { .. } => self.metrics.settlements_total.increment(1),
                SettlementOutcome::Skipped(reason) => {
                    trace!(%entity, %category, %reason, "Settlement skipped");
                    self.metrics.settlements_skipped_total.increment(1);
                }
            }
            report.outcomes.push((entity, outcome));
        }

        Ok(report)
    }

    /// Strict-policy preconditions.
    fn check_settleable(
        &self,
        category: BillingCategory,
        entity: EntityId,
    ) -> Result<(), LedgerError> {
        let record = self.record(entity);
        if !record.is_initialized() {
            return Err(LedgerError::NotInitialized(entity));
        }
        if record.accumulated(category).is_zero() {
            return Err(LedgerError::NothingToSettle { entity, category });
        }
        Ok(())
    }

    fn settle_entity(
        &mut self,
        category: BillingCategory,
        entity: EntityId,
    ) -> Result<SettlementOutcome, LedgerError> {
        let record = self.record(entity);
        if !record.is_initialized() {
            return Ok(SettlementOutcome::Skipped(SkipReason::Uninitialized));
        }

        let accumulated = record.accumulated(category);
        if accumulated.is_zero() {
            return Ok(SettlementOutcome::Skipped(SkipReason::NothingToSettle));
        }

        let Some(rail) = self.rails.rail_id(entity, category)? else {
            return Ok(SettlementOutcome::Skipped(SkipReason::NoRail));
        };

        let lockup = self.rails.lockup_limit(rail)?;
        let requested = accumulated.min(lockup);
        if requested.is_zero() {
            return Ok(SettlementOutcome::Skipped(SkipReason::LockupExhausted));
        }

        let accepted = self.rails.apply(entity, requested, category)?;
        if accepted > requested {
            return Err(RailError::OverAccepted { requested, accepted }.into());
        }
        if accepted.is_zero() {
            return Ok(SettlementOutcome::Skipped(SkipReason::Declined));
        }

        let record = self.records.entry(entity).or_default();
        let (from_epoch, to_epoch) = record.settle(category, accepted);
        let remaining = record.accumulated(category);

        debug!(
            %entity,
            %category,
            %rail,
            amount = %accepted,
            %remaining,
            from_epoch,
            to_epoch,
            "Settled"
        );
        self.sink.emit(&LedgerEvent::Settled {
            entity,
            category,
            from_epoch,
            to_epoch,
            amount: accepted,
        });

        Ok(SettlementOutcome::Settled { amount: accepted, from_epoch, to_epoch, remaining })
    }
}
