//! In-memory payment rails.

use std::collections::HashMap;

use parking_lot::RwLock;
use tally_primitives::{Amount, BillingCategory, EntityId, RailId};

use crate::{PaymentRails, RailError};

/// A payment applied through [`MemoryRails`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedPayment {
    /// The paying entity.
    pub entity: EntityId,
    /// The category of the rail drawn from.
    pub category: BillingCategory,
    /// Amount requested by the ledger.
    pub requested: Amount,
    /// Amount drawn from the lockup.
    pub accepted: Amount,
}

#[derive(Debug, Default)]
struct State {
    rails: HashMap<(EntityId, BillingCategory), RailId>,
    lockups: HashMap<RailId, Amount>,
    next_id: u64,
    applied: Vec<AppliedPayment>,
    terminated: Vec<EntityId>,
}

/// Payment rails held in memory.
///
/// Each (entity, category) pair has at most one rail with a lockup balance.
/// Applying a payment draws `min(requested, lockup)` from it. Only an entity
/// with a primary rail can be terminated, and terminated rails stay open so
/// accumulated amounts remain collectable.
#[derive(Debug, Default)]
pub struct MemoryRails {
    state: RwLock<State>,
}

impl MemoryRails {
    /// Create an empty rail registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a rail, or reset the lockup of an existing one.
    pub fn open_rail(&self, entity: EntityId, category: BillingCategory, lockup: Amount) -> RailId {
        let mut state = self.state.write();
        let rail = match state.rails.get(&(entity, category)) {
            Some(&rail) => rail,
            None => {
                state.next_id += 1;
                // next_id starts at 1, so it is never zero
                let rail = RailId::new(state.next_id).unwrap_or(RailId::MIN);
                state.rails.insert((entity, category), rail);
                rail
            }
        };
        state.lockups.insert(rail, lockup);
        rail
    }

    /// Add `amount` to the lockup of an existing rail, returning the new lockup.
    pub fn top_up(
        &self,
        entity: EntityId,
        category: BillingCategory,
        amount: Amount,
    ) -> Result<Amount, RailError> {
        let mut state = self.state.write();
        let rail = *state.rails.get(&(entity, category)).ok_or(RailError::NoRail { entity, category })?;
        let lockup = state.lockups.entry(rail).or_default();
        *lockup = lockup.saturating_add(amount);
        Ok(*lockup)
    }

    /// Every payment applied so far, in order.
    pub fn applied(&self) -> Vec<AppliedPayment> {
        self.state.read().applied.clone()
    }

    /// Sum of accepted payments for the entity's rail in `category`.
    pub fn applied_total(&self, entity: EntityId, category: BillingCategory) -> Amount {
        self.state
            .read()
            .applied
            .iter()
            .filter(|p| p.entity == entity && p.category == category)
            .fold(Amount::ZERO, |acc, p| acc.saturating_add(p.accepted))
    }

    /// Terminated entities, in termination order.
    pub fn terminated(&self) -> Vec<EntityId> {
        self.state.read().terminated.clone()
    }
}

impl PaymentRails for MemoryRails {
    fn rail_id(
        &self,
        entity: EntityId,
        category: BillingCategory,
    ) -> Result<Option<RailId>, RailError> {
        Ok(self.state.read().rails.get(&(entity, category)).copied())
    }

    fn lockup_limit(&self, rail: RailId) -> Result<Amount, RailError> {
        self.state.read().lockups.get(&rail).copied().ok_or(RailError::UnknownRail(rail))
    }

    fn apply(
        &self,
        entity: EntityId,
        amount: Amount,
        category: BillingCategory,
    ) -> Result<Amount, RailError> {
        let mut state = self.state.write();
        let rail = *state.rails.get(&(entity, category)).ok_or(RailError::NoRail { entity, category })?;
        let lockup = state.lockups.entry(rail).or_default();
        let accepted = amount.min(*lockup);
        *lockup -= accepted;

        state.applied.push(AppliedPayment { entity, category, requested: amount, accepted });
        Ok(accepted)
    }

    fn terminate(&self, entity: EntityId) -> Result<(), RailError> {
        let mut state = self.state.write();
        let category = BillingCategory::Primary;
        if !state.rails.contains_key(&(entity, category)) {
            return Err(RailError::NoRail { entity, category });
        }
        if !state.terminated.contains(&entity) {
            state.terminated.push(entity);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
