//! Ledger service actor (runs in its own tokio task).

use tally_api::{EventSink, LedgerEvent, PaymentRails};
use tally_primitives::{Address, Amount, BillingCategory, EntityId, Epoch, SettlementPolicy, Units};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{LedgerError, RateTable, Roles, SettlementReport, UsageLedger, UsageRecord};

/// Reply channel for a fallible command.
type Responder<T> = oneshot::Sender<Result<T, LedgerError>>;

/// Commands from the handle to the service.
pub enum LedgerCommand {
    /// Record usage for one entity and epoch.
    RecordUsage {
        caller: Address,
        entity: EntityId,
        epoch: Epoch,
        primary_units: Units,
        secondary_units: Units,
        response_tx: Responder<LedgerEvent>,
    },
    /// Record a batch of usage reports.
    RecordUsageBatch {
        caller: Address,
        entities: Vec<EntityId>,
        epochs: Vec<Epoch>,
        primary_units: Vec<Units>,
        secondary_units: Vec<Units>,
        response_tx: Responder<Vec<LedgerEvent>>,
    },
    /// Settle a category for a set of entities.
    Settle {
        category: BillingCategory,
        entities: Vec<EntityId>,
        response_tx: Responder<SettlementReport>,
    },
    /// Terminate an entity's primary rail.
    Terminate {
        caller: Address,
        entity: EntityId,
        response_tx: Responder<()>,
    },
    /// Change a rate.
    SetRate {
        caller: Address,
        category: BillingCategory,
        rate: Amount,
        response_tx: Responder<Amount>,
    },
    /// Reassign the reporter.
    SetReporter {
        caller: Address,
        reporter: Address,
        response_tx: Responder<()>,
    },
    /// Hand over the administrator role.
    TransferAdmin {
        caller: Address,
        admin: Address,
        response_tx: Responder<()>,
    },
    /// Read one entity's record.
    Record {
        entity: EntityId,
        response_tx: oneshot::Sender<UsageRecord>,
    },
    /// List entities with a record.
    Entities {
        response_tx: oneshot::Sender<Vec<EntityId>>,
    },
    /// Read the rate table.
    Rates {
        response_tx: oneshot::Sender<RateTable>,
    },
    /// Read the role holders.
    Roles {
        response_tx: oneshot::Sender<Roles>,
    },
    /// Read the settlement policy.
    Policy {
        response_tx: oneshot::Sender<SettlementPolicy>,
    },
}

/// Owns the [`UsageLedger`] and serializes every call made through handles.
pub struct LedgerService<R, E> {
    command_rx: mpsc::UnboundedReceiver<LedgerCommand>,
    ledger: UsageLedger<R, E>,
}

impl<R: PaymentRails, E: EventSink> LedgerService<R, E> {
    /// Create a new ledger service.
    pub fn new(command_rx: mpsc::UnboundedReceiver<LedgerCommand>, ledger: UsageLedger<R, E>) -> Self {
        Self { command_rx, ledger }
    }

    /// Run the service loop until every handle is dropped.
    ///
    /// Returns the ledger in its final state.
    pub async fn run(mut self) -> UsageLedger<R, E> {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(entities = self.ledger.records.len(), "Ledger service shutting down");
        self.ledger
    }

    fn handle_command(&mut self, cmd: LedgerCommand) {
        // A dropped receiver only means the caller stopped waiting.
        match cmd {
            LedgerCommand::RecordUsage {
                caller,
                entity,
                epoch,
                primary_units,
                secondary_units,
                response_tx,
            } => {
                let result =
                    self.ledger.record_usage(caller, entity, epoch, primary_units, secondary_units);
                let _ = response_tx.send(result);
            }
            LedgerCommand::RecordUsageBatch {
                caller,
                entities,
                epochs,
                primary_units,
                secondary_units,
                response_tx,
            } => {
                let result = self.ledger.record_usage_batch(
                    caller,
                    &entities,
                    &epochs,
                    &primary_units,
                    &secondary_units,
                );
                let _ = response_tx.send(result);
            }
            LedgerCommand::Settle { category, entities, response_tx } => {
                let _ = response_tx.send(self.ledger.settle(category, &entities));
            }
            LedgerCommand::Terminate { caller, entity, response_tx } => {
                let _ = response_tx.send(self.ledger.terminate(caller, entity));
            }
            LedgerCommand::SetRate { caller, category, rate, response_tx } => {
                let _ = response_tx.send(self.ledger.set_rate(caller, category, rate));
            }
            LedgerCommand::SetReporter { caller, reporter, response_tx } => {
                let _ = response_tx.send(self.ledger.set_reporter(caller, reporter));
            }
            LedgerCommand::TransferAdmin { caller, admin, response_tx } => {
                let _ = response_tx.send(self.ledger.transfer_admin(caller, admin));
            }
            LedgerCommand::Record { entity, response_tx } => {
                let _ = response_tx.send(self.ledger.record(entity));
            }
            LedgerCommand::Entities { response_tx } => {
                let _ = response_tx.send(self.ledger.entities());
            }
            LedgerCommand::Rates { response_tx } => {
                let _ = response_tx.send(*self.ledger.rates());
            }
            LedgerCommand::Roles { response_tx } => {
                let _ = response_tx.send(*self.ledger.roles());
            }
            LedgerCommand::Policy { response_tx } => {
                let _ = response_tx.send(self.ledger.policy());
            }
        }
    }
}
