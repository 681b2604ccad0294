//! Test utilities for tally crates.
//!
//! - [`MockRails`] - [`MemoryRails`] with failure injection and acceptance overrides
//! - [`RecordingSink`] - keeps every emitted [`LedgerEvent`]
//! - [`TestConfig`] - a [`LedgerConfig`] with settable rates and policy
//! - [`admin`], [`reporter`], [`outsider`] - fixed caller identities

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tally_api::{
    AppliedPayment, EventSink, LedgerConfig, LedgerEvent, MemoryRails, PaymentRails, RailError,
};
use tally_primitives::{Address, Amount, BillingCategory, EntityId, RailId, SettlementPolicy, U256};

/// The administrator used in tests.
pub fn admin() -> Address {
    Address::repeat_byte(0xad)
}

/// The reporter used in tests.
pub fn reporter() -> Address {
    Address::repeat_byte(0x5e)
}

/// An identity holding no role.
pub fn outsider() -> Address {
    Address::repeat_byte(0x0f)
}

#[derive(Debug, Default)]
struct Overrides {
    fail_next: Option<String>,
    fail_for: HashMap<EntityId, String>,
    accept_cap: Option<Amount>,
    over_accept: Option<Amount>,
    apply_calls: usize,
    last_requested: Option<Amount>,
}

/// Payment rails for tests.
///
/// Behaves like [`MemoryRails`] unless told otherwise.
#[derive(Debug, Default)]
pub struct MockRails {
    inner: MemoryRails,
    overrides: Mutex<Overrides>,
}

impl MockRails {
    /// Create mock rails with no rails open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a rail with the given lockup.
    pub fn open_rail(&self, entity: EntityId, category: BillingCategory, lockup: Amount) -> RailId {
        self.inner.open_rail(entity, category, lockup)
    }

    /// Raise the lockup of an open rail, returning the new lockup.
    pub fn top_up(
        &self,
        entity: EntityId,
        category: BillingCategory,
        amount: Amount,
    ) -> Result<Amount, RailError> {
        self.inner.top_up(entity, category, amount)
    }

    /// Fail the next collaborator call of any kind.
    pub fn fail_next(&self, message: &str) {
        self.overrides.lock().fail_next = Some(message.to_string());
    }

    /// Reject every `apply` for `entity`.
    pub fn fail_for(&self, entity: EntityId, reason: &str) {
        self.overrides.lock().fail_for.insert(entity, reason.to_string());
    }

    /// Accept at most `cap` per `apply`, regardless of lockup.
    pub fn accept_at_most(&self, cap: Amount) {
        self.overrides.lock().accept_cap = Some(cap);
    }

    /// Report `extra` more than was requested on every `apply`.
    pub fn over_accept(&self, extra: Amount) {
        self.overrides.lock().over_accept = Some(extra);
    }

    /// Number of `apply` calls that reached the rails.
    pub fn apply_calls(&self) -> usize {
        self.overrides.lock().apply_calls
    }

    /// The amount requested by the most recent `apply`.
    pub fn last_requested(&self) -> Option<Amount> {
        self.overrides.lock().last_requested
    }

    /// Every payment applied so far.
    pub fn applied(&self) -> Vec<AppliedPayment> {
        self.inner.applied()
    }

    /// Sum of accepted payments for one rail.
    pub fn applied_total(&self, entity: EntityId, category: BillingCategory) -> Amount {
        self.inner.applied_total(entity, category)
    }

    /// Terminated entities, in order.
    pub fn terminated(&self) -> Vec<EntityId> {
        self.inner.terminated()
    }

    fn take_failure(&self) -> Result<(), RailError> {
        match self.overrides.lock().fail_next.take() {
            Some(message) => Err(RailError::Unavailable { message }),
            None => Ok(()),
        }
    }
}

impl PaymentRails for MockRails {
    fn rail_id(
        &self,
        entity: EntityId,
        category: BillingCategory,
    ) -> Result<Option<RailId>, RailError> {
        self.take_failure()?;
        self.inner.rail_id(entity, category)
    }

    fn lockup_limit(&self, rail: RailId) -> Result<Amount, RailError> {
        self.take_failure()?;
        self.inner.lockup_limit(rail)
    }

    fn apply(
        &self,
        entity: EntityId,
        amount: Amount,
        category: BillingCategory,
    ) -> Result<Amount, RailError> {
        self.take_failure()?;

        let (cap, extra) = {
            let mut overrides = self.overrides.lock();
            if let Some(reason) = overrides.fail_for.get(&entity) {
                return Err(RailError::Rejected { entity, category, reason: reason.clone() });
            }
            overrides.apply_calls += 1;
            overrides.last_requested = Some(amount);
            (overrides.accept_cap, overrides.over_accept)
        };

        let bounded = cap.map_or(amount, |cap| amount.min(cap));
        let accepted = self.inner.apply(entity, bounded, category)?;
        Ok(extra.map_or(accepted, |extra| accepted.saturating_add(extra)))
    }

    fn terminate(&self, entity: EntityId) -> Result<(), RailError> {
        self.take_failure()?;
        self.inner.terminate(entity)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Records every emitted fact. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingSink {
    /// Snapshot of the facts emitted so far.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }

    /// Drop recorded facts.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LedgerEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Ledger configuration with explicit values.
#[derive(Debug, Clone, Copy)]
pub struct TestConfig {
    primary_rate: Amount,
    secondary_rate: Amount,
    mutable_rates: bool,
    policy: SettlementPolicy,
}

impl TestConfig {
    /// Mutable rates, skip policy.
    pub fn new(primary_rate: Amount, secondary_rate: Amount) -> Self {
        Self { primary_rate, secondary_rate, mutable_rates: true, policy: SettlementPolicy::Skip }
    }

    /// Set the settlement policy.
    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fix rates for the ledger's lifetime.
    pub fn with_fixed_rates(mut self) -> Self {
        self.mutable_rates = false;
        self
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new(U256::from(100u64), U256::from(200u64))
    }
}

impl LedgerConfig for TestConfig {
    fn primary_rate(&self) -> Amount {
        self.primary_rate
    }

    fn secondary_rate(&self) -> Amount {
        self.secondary_rate
    }

    fn mutable_rates(&self) -> bool {
        self.mutable_rates
    }

    fn settlement_policy(&self) -> SettlementPolicy {
        self.policy
    }
}
