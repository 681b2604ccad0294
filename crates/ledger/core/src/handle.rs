//! Ledger handle for interacting with the service.
//!
//! The handle is cheap to clone and can be used from multiple tasks. Calls
//! are applied one at a time in the order the service receives them.

use tally_api::{EventSink, LedgerEvent, PaymentRails};
use tally_primitives::{Address, Amount, BillingCategory, EntityId, Epoch, SettlementPolicy, Units};
use tokio::sync::{mpsc, oneshot};

use crate::error::ServiceError;
use crate::service::{LedgerCommand, LedgerService};
use crate::{LedgerError, RateTable, Roles, SettlementReport, UsageLedger, UsageRecord};

/// Create a ledger service and a handle to it.
///
/// The service must be spawned (or awaited) for handle calls to complete.
pub fn create_ledger_actor<R, E>(ledger: UsageLedger<R, E>) -> (LedgerService<R, E>, LedgerHandle)
where
    R: PaymentRails,
    E: EventSink,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    (LedgerService::new(command_rx, ledger), LedgerHandle::new(command_tx))
}

/// Handle for interacting with the ledger service.
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    command_tx: mpsc::UnboundedSender<LedgerCommand>,
}

impl LedgerHandle {
    /// Create a new handle from a command sender.
    pub fn new(command_tx: mpsc::UnboundedSender<LedgerCommand>) -> Self {
        Self { command_tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, LedgerError>>) -> LedgerCommand,
    ) -> Result<T, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx.send(build(tx)).map_err(|_| ServiceError::ServiceStopped)?;
        Ok(rx.await.map_err(|_| ServiceError::ServiceStopped)??)
    }

    async fn query<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerCommand,
    ) -> Result<T, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx.send(build(tx)).map_err(|_| ServiceError::ServiceStopped)?;
        rx.await.map_err(|_| ServiceError::ServiceStopped)
    }

    /// Record usage for one entity and epoch.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::ServiceStopped`] if the service has stopped
    /// - [`ServiceError::Ledger`] if the ledger rejected the report
    pub async fn record_usage(
        &self,
        caller: Address,
        entity: EntityId,
        epoch: Epoch,
        primary_units: Units,
        secondary_units: Units,
    ) -> Result<LedgerEvent, ServiceError> {
        self.request(|response_tx| LedgerCommand::RecordUsage {
            caller,
            entity,
            epoch,
            primary_units,
            secondary_units,
            response_tx,
        })
        .await
    }

    /// Record a batch of usage reports given as parallel arrays.
    pub async fn record_usage_batch(
        &self,
        caller: Address,
        entities: Vec<EntityId>,
        epochs: Vec<Epoch>,
        primary_units: Vec<Units>,
        secondary_units: Vec<Units>,
    ) -> Result<Vec<LedgerEvent>, ServiceError> {
        self.request(|response_tx| LedgerCommand::RecordUsageBatch {
            caller,
            entities,
            epochs,
            primary_units,
            secondary_units,
            response_tx,
        })
        .await
    }

    /// Settle `category` for each of `entities`.
    pub async fn settle(
        &self,
        category: BillingCategory,
        entities: Vec<EntityId>,
    ) -> Result<SettlementReport, ServiceError> {
        self.request(|response_tx| LedgerCommand::Settle { category, entities, response_tx }).await
    }

    /// Terminate an entity's primary rail.
    pub async fn terminate(&self, caller: Address, entity: EntityId) -> Result<(), ServiceError> {
        self.request(|response_tx| LedgerCommand::Terminate { caller, entity, response_tx }).await
    }

    /// Change the rate for `category`, returning the previous rate.
    pub async fn set_rate(
        &self,
        caller: Address,
        category: BillingCategory,
        rate: Amount,
    ) -> Result<Amount, ServiceError> {
        self.request(|response_tx| LedgerCommand::SetRate { caller, category, rate, response_tx })
            .await
    }

    /// Reassign the reporter.
    pub async fn set_reporter(&self, caller: Address, reporter: Address) -> Result<(), ServiceError> {
        self.request(|response_tx| LedgerCommand::SetReporter { caller, reporter, response_tx })
            .await
    }

    /// Hand over the administrator role.
    pub async fn transfer_admin(&self, caller: Address, admin: Address) -> Result<(), ServiceError> {
        self.request(|response_tx| LedgerCommand::TransferAdmin { caller, admin, response_tx })
            .await
    }

    /// The record for `entity`.
    pub async fn record(&self, entity: EntityId) -> Result<UsageRecord, ServiceError> {
        self.query(|response_tx| LedgerCommand::Record { entity, response_tx }).await
    }

    /// Entities with a record, in ascending order.
    pub async fn entities(&self) -> Result<Vec<EntityId>, ServiceError> {
        self.query(|response_tx| LedgerCommand::Entities { response_tx }).await
    }

    /// The current rate table.
    pub async fn rates(&self) -> Result<RateTable, ServiceError> {
        self.query(|response_tx| LedgerCommand::Rates { response_tx }).await
    }

    /// The current role holders.
    pub async fn roles(&self) -> Result<Roles, ServiceError> {
        self.query(|response_tx| LedgerCommand::Roles { response_tx }).await
    }

    /// The settlement policy.
    pub async fn policy(&self) -> Result<SettlementPolicy, ServiceError> {
        self.query(|response_tx| LedgerCommand::Policy { response_tx }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultLedgerConfig;
    use assert_matches::assert_matches;
    use tally_primitives::U256;
    use tally_test_utils::{MockRails, RecordingSink, admin, outsider, reporter};

    fn spawn_ledger() -> (tokio::task::JoinHandle<UsageLedger<MockRails, RecordingSink>>, LedgerHandle) {
        let roles = Roles::new(admin(), reporter()).expect("valid roles");
        let rails = MockRails::new();
        rails.open_rail(EntityId::new(1), BillingCategory::Primary, U256::from(1_000_000u64));
        let ledger = UsageLedger::new(&DefaultLedgerConfig, roles, rails)
            .expect("valid config")
            .with_sink(RecordingSink::default());

        let (service, handle) = create_ledger_actor(ledger);
        (tokio::spawn(service.run()), handle)
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let (task, handle) = spawn_ledger();
        let entity = EntityId::new(1);

        handle.record_usage(reporter(), entity, 1, 1000, 500).await.expect("report accepted");
        handle
            .record_usage_batch(reporter(), vec![entity], vec![2], vec![2000], vec![1000])
            .await
            .expect("batch accepted");

        let report =
            handle.settle(BillingCategory::Primary, vec![entity]).await.expect("settlement runs");
        assert_eq!(report.total_settled(), U256::from(300_000u64));

        let record = handle.record(entity).await.expect("service running");
        assert_eq!(record.primary_accumulated(), U256::ZERO);
        assert_eq!(handle.entities().await.expect("service running"), vec![entity]);

        drop(handle);
        let ledger = task.await.expect("service task completes");
        assert_eq!(ledger.sink.events().len(), 3);
    }

    #[tokio::test]
    async fn test_handle_surfaces_ledger_errors() {
        let (_task, handle) = spawn_ledger();

        assert_matches!(
            handle.record_usage(outsider(), EntityId::new(1), 1, 1, 1).await,
            Err(ServiceError::Ledger(LedgerError::Unauthorized { .. }))
        );
        assert_matches!(
            handle.set_rate(admin(), BillingCategory::Primary, U256::ZERO).await,
            Err(ServiceError::Ledger(LedgerError::InvalidRate { .. }))
        );

        assert_eq!(handle.policy().await.expect("service running"), SettlementPolicy::Skip);
        assert_eq!(
            handle.rates().await.expect("service running").rate(BillingCategory::Secondary),
            U256::from(200u64)
        );

        handle.set_reporter(admin(), outsider()).await.expect("admin may reassign");
        assert_eq!(handle.roles().await.expect("service running").reporter(), outsider());
    }

    #[tokio::test]
    async fn test_handle_after_service_stopped() {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        drop(command_rx);
        let handle = LedgerHandle::new(command_tx);

        assert_matches!(handle.entities().await, Err(ServiceError::ServiceStopped));
        assert_matches!(
            handle.settle(BillingCategory::Secondary, vec![]).await,
            Err(ServiceError::ServiceStopped)
        );
    }
}
