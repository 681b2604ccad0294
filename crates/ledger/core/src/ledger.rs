//! The usage ledger.
//!
//! [`UsageLedger`] owns every per-entity [`UsageRecord`], the [`RateTable`],
//! the [`Roles`] and the payment collaborator. Each public method is one
//! top-level call: it either commits completely or returns an error having
//! changed nothing. The exception is settlement, where each
//! entity of a batch is independent (see [`UsageLedger::settle`]).

use std::collections::HashMap;

use tally_api::{EventSink, LedgerConfig, LedgerEvent, NoEvents, PaymentRails};
use tally_primitives::{Address, Amount, BillingCategory, EntityId, Epoch, SettlementPolicy, Units};
use tracing::{debug, info, warn};

use crate::epoch::{validate_batch_lengths, validate_epoch};
use crate::metrics::LedgerMetrics;
use crate::{LedgerError, RateTable, Roles, UsageRecord};

/// Epoch-ordered usage ledger with lockup-bounded settlement.
///
/// Generic over the payment collaborator `R` and the fact sink `E`.
#[derive(Debug)]
pub struct UsageLedger<R, E = NoEvents> {
    pub(crate) rates: RateTable,
    pub(crate) roles: Roles,
    pub(crate) policy: SettlementPolicy,
    pub(crate) rails: R,
    pub(crate) sink: E,
    pub(crate) records: HashMap<EntityId, UsageRecord>,
    pub(crate) metrics: LedgerMetrics,
}

impl<R: PaymentRails> UsageLedger<R, NoEvents> {
    /// Create a ledger from configuration.
    ///
    /// Fails with [`LedgerError::InvalidRate`] if either configured rate is zero.
    pub fn new(config: &impl LedgerConfig, roles: Roles, rails: R) -> Result<Self, LedgerError> {
        Ok(Self {
            rates: RateTable::from_config(config)?,
            roles,
            policy: config.settlement_policy(),
            rails,
            sink: NoEvents,
            records: HashMap::new(),
            metrics: LedgerMetrics::default(),
        })
    }
}

impl<R: PaymentRails, E: EventSink> UsageLedger<R, E> {
    /// Replace the fact sink.
    pub fn with_sink<S: EventSink>(self, sink: S) -> UsageLedger<R, S> {
        UsageLedger {
            rates: self.rates,
            roles: self.roles,
            policy: self.policy,
            rails: self.rails,
            sink,
            records: self.records,
            metrics: self.metrics,
        }
    }

    /// The record for `entity`, or the all-zero default if never seen.
    pub fn record(&self, entity: EntityId) -> UsageRecord {
        self.records.get(&entity).copied().unwrap_or_default()
    }

    /// Entities with a record.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<_> = self.records.keys().copied().collect();
        entities.sort_unstable();
        entities
    }

    /// The current rate table.
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// The current role holders.
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// The settlement policy.
    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// The payment collaborator.
    pub fn rails(&self) -> &R {
        &self.rails
    }

    /// Record usage for one entity and epoch. Reporter only.
    pub fn record_usage(
        &mut self,
        caller: Address,
        entity: EntityId,
        epoch: Epoch,
        primary_units: Units,
        secondary_units: Units,
    ) -> Result<LedgerEvent, LedgerError> {
        self.roles.ensure_reporter(caller)?;

        let mut record = self.record(entity);
        let event =
            apply_report(&self.rates, entity, &mut record, epoch, primary_units, secondary_units)
                .inspect_err(|err| {
                    self.metrics.reports_rejected_total.increment(1);
                    debug!(%entity, epoch, error = %err, "Usage report rejected");
                })?;

        self.records.insert(entity, record);
        self.metrics.reports_total.increment(1);
        self.sink.emit(&event);
        Ok(event)
    }

    /// Record a batch of usage reports given as parallel arrays. Reporter only.
    ///
    /// All-or-nothing: if any item fails validation or overflows, no item of
    /// the batch takes effect. Items are validated in order against the state
    /// left by earlier items, so an epoch repeated within the batch is rejected.
    pub fn record_usage_batch(
        &mut self,
        caller: Address,
        entities: &[EntityId],
        epochs: &[Epoch],
        primary_units: &[Units],
        secondary_units: &[Units],
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.roles.ensure_reporter(caller)?;
        let len = validate_batch_lengths(
            entities.len(),
            epochs.len(),
            primary_units.len(),
            secondary_units.len(),
        )?;

        let (records, events) =
            match self.stage_reports(entities, epochs, primary_units, secondary_units, len) {
                Ok(staged) => staged,
                Err(err) => {
                    self.metrics.reports_rejected_total.increment(1);
                    debug!(error = %err, items = len, "Usage batch rejected");
                    return Err(err);
                }
            };

        self.records.extend(records);
        self.metrics.reports_total.increment(events.len() as u64);
        for event in &events {
            self.sink.emit(event);
        }

        Ok(events)
    }

    /// Validate and apply every item against a scratch copy of the records.
    fn stage_reports(
        &self,
        entities: &[EntityId],
        epochs: &[Epoch],
        primary_units: &[Units],
        secondary_units: &[Units],
        len: usize,
    ) -> Result<(HashMap<EntityId, UsageRecord>, Vec<LedgerEvent>), LedgerError> {
        let mut staged: HashMap<EntityId, UsageRecord> = HashMap::new();
        let mut events = Vec::with_capacity(len);

        let items = entities.iter().zip(epochs).zip(primary_units).zip(secondary_units);
        for (((&entity, &epoch), &primary), &secondary) in items {
            let record = staged.entry(entity).or_insert_with(|| self.record(entity));
            events.push(apply_report(&self.rates, entity, record, epoch, primary, secondary)?);
        }

        Ok((staged, events))
    }

    /// Terminate an entity's primary rail. Reporter or administrator.
    ///
    /// Accumulated amounts are kept and remain settleable.
    pub fn terminate(&mut self, caller: Address, entity: EntityId) -> Result<(), LedgerError> {
        self.roles.ensure_operator(caller)?;

        if let Err(err) = self.rails.terminate(entity) {
            warn!(%entity, error = %err, rails = self.rails.name(), "Rail termination failed");
            return Err(err.into());
        }

        info!(%entity, "Entity terminated");
        self.metrics.terminations_total.increment(1);
        self.sink.emit(&LedgerEvent::Terminated { entity });
        Ok(())
    }

    /// Change the rate for `category`. Administrator only.
    ///
    /// Applies to usage reported from now on; accumulated amounts are not
    /// repriced.
    pub fn set_rate(
        &mut self,
        caller: Address,
        category: BillingCategory,
        rate: Amount,
    ) -> Result<Amount, LedgerError> {
        self.roles.ensure_admin(caller)?;
        let old = self.rates.set(category, rate)?;

        info!(%category, %old, new = %rate, "Rate updated");
        self.sink.emit(&LedgerEvent::RateUpdated { category, old, new: rate });
        Ok(old)
    }

    /// Reassign the reporter. Administrator only.
    pub fn set_reporter(&mut self, caller: Address, reporter: Address) -> Result<(), LedgerError> {
        self.roles.ensure_admin(caller)?;
        let old = self.roles.replace_reporter(reporter)?;

        info!(%old, new = %reporter, "Reporter changed");
        self.sink.emit(&LedgerEvent::ReporterChanged { old, new: reporter });
        Ok(())
    }

    /// Hand the administrator role to `admin`. Administrator only.
    pub fn transfer_admin(&mut self, caller: Address, admin: Address) -> Result<(), LedgerError> {
        self.roles.ensure_admin(caller)?;
        let old = self.roles.replace_admin(admin)?;

        info!(%old, new = %admin, "Admin changed");
        self.sink.emit(&LedgerEvent::AdminChanged { old, new: admin });
        Ok(())
    }
}

/// Validate one report, convert it at the current rates and accumulate it.
fn apply_report(
    rates: &RateTable,
    entity: EntityId,
    record: &mut UsageRecord,
    epoch: Epoch,
    primary_units: Units,
    secondary_units: Units,
) -> Result<LedgerEvent, LedgerError> {
    validate_epoch(entity, record, epoch)?;

    let primary = rates
        .convert(BillingCategory::Primary, primary_units)
        .ok_or(LedgerError::Overflow { entity, category: BillingCategory::Primary })?;
    let secondary = rates
        .convert(BillingCategory::Secondary, secondary_units)
        .ok_or(LedgerError::Overflow { entity, category: BillingCategory::Secondary })?;

    let from_epoch = record.max_reported_epoch() + 1;
    record
        .accumulate(epoch, primary, secondary)
        .map_err(|category| LedgerError::Overflow { entity, category })?;

    debug!(%entity, epoch, %primary, %secondary, "Usage accumulated");

    Ok(LedgerEvent::UsageReported {
        entity,
        from_epoch,
        to_epoch: epoch,
        primary_units,
        secondary_units,
    })
}
