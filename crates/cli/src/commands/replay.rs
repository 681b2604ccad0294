//! Replay command - run a scenario against an in-memory ledger.
//!
//! Every step goes through a [`LedgerHandle`], so the replay exercises the
//! same path a long-running host would. Payment rails are held in memory.

use std::sync::Arc;

use eyre::{Result, WrapErr};
use tally_api::{AppliedPayment, LoggingEventSink, MemoryRails};
use tally_ledger::{LedgerHandle, UsageLedger, UsageRecord, create_ledger_actor};
use tally_primitives::{BillingCategory, EntityId, U256};
use tracing::{info, warn};

use crate::cli::ReplayArgs;
use crate::config::TallyConfig;
use crate::scenario::{Caller, NamedCaller, Scenario, Step};

/// Final state of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Every entity with a record, in ascending order.
    pub records: Vec<(EntityId, UsageRecord)>,
    /// Payments applied against rails, in order.
    pub applied: Vec<AppliedPayment>,
    /// Number of steps that failed (only non-zero with `--keep-going`).
    pub failed_steps: usize,
}

/// Run the replay command.
pub async fn run(args: ReplayArgs, config: TallyConfig) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    info!(
        scenario = %args.scenario.display(),
        rails = scenario.rails.len(),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let outcome = replay(scenario, &config, args.keep_going).await?;

    for (entity, record) in &outcome.records {
        println!("{}", format_record(*entity, record));
    }
    if outcome.failed_steps > 0 {
        warn!(failed = outcome.failed_steps, "Replay finished with failed steps");
    }
    Ok(())
}

/// Replay `scenario` and return the final ledger state.
pub async fn replay(scenario: Scenario, config: &TallyConfig, keep_going: bool) -> Result<ReplayOutcome> {
    let rails = Arc::new(MemoryRails::new());
    for rail in &scenario.rails {
        rails.open_rail(rail.entity, rail.category, U256::from(rail.lockup));
    }

    let ledger = UsageLedger::new(&config.ledger, config.roles.roles()?, Arc::clone(&rails))?
        .with_sink(LoggingEventSink);
    let (service, handle) = create_ledger_actor(ledger);
    let task = tokio::spawn(service.run());

    let mut failed_steps = 0;
    for (index, step) in scenario.steps.into_iter().enumerate() {
        let number = index + 1;
        let action = step.action();
        match execute(&handle, &rails, step).await {
            Ok(summary) => info!(step = number, action, "{summary}"),
            Err(err) if keep_going => {
                failed_steps += 1;
                warn!(step = number, action, error = %err, "Step failed");
            }
            Err(err) => return Err(err.wrap_err(format!("step {number} ({action}) failed"))),
        }
    }

    let mut records = Vec::new();
    for entity in handle.entities().await? {
        records.push((entity, handle.record(entity).await?));
    }

    drop(handle);
    task.await.wrap_err("ledger service panicked")?;

    Ok(ReplayOutcome { records, applied: rails.applied(), failed_steps })
}

async fn execute(handle: &LedgerHandle, rails: &MemoryRails, step: Step) -> Result<String> {
    let summary = match step {
        Step::Report { entity, epoch, primary, secondary, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Reporter).await?;
            handle.record_usage(caller, entity, epoch, primary, secondary).await?.to_string()
        }
        Step::ReportBatch { entities, epochs, primary, secondary, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Reporter).await?;
            let events =
                handle.record_usage_batch(caller, entities, epochs, primary, secondary).await?;
            format!("{} reports accepted", events.len())
        }
        Step::Settle { category, entities } => {
            let report = handle.settle(category, entities).await?;
            let skipped = report.outcomes().len() - report.settled_count();
            format!(
                "{category}: settled {} of {} entities, total {} ({skipped} skipped)",
                report.settled_count(),
                report.outcomes().len(),
                report.total_settled(),
            )
        }
        Step::TopUp { entity, category, amount } => {
            let lockup = rails.top_up(entity, category, U256::from(amount))?;
            format!("{entity} {category} lockup now {lockup}")
        }
        Step::Terminate { entity, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Reporter).await?;
            handle.terminate(caller, entity).await?;
            format!("terminated {entity}")
        }
        Step::SetRate { category, rate, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Admin).await?;
            let old = handle.set_rate(caller, category, U256::from(rate)).await?;
            format!("{category} rate {old} -> {rate}")
        }
        Step::SetReporter { reporter, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Admin).await?;
            handle.set_reporter(caller, reporter).await?;
            format!("reporter is now {reporter}")
        }
        Step::TransferAdmin { admin, caller } => {
            let caller = resolve(handle, caller, NamedCaller::Admin).await?;
            handle.transfer_admin(caller, admin).await?;
            format!("admin is now {admin}")
        }
    };
    Ok(summary)
}

async fn resolve(
    handle: &LedgerHandle,
    caller: Option<Caller>,
    default: NamedCaller,
) -> Result<tally_primitives::Address> {
    let roles = handle.roles().await?;
    Ok(caller.unwrap_or(Caller::Named(default)).resolve(&roles))
}

/// One line per entity: accumulated amount and settled epoch per category.
pub fn format_record(entity: EntityId, record: &UsageRecord) -> String {
    let category = |c: BillingCategory| {
        let balance = record.balance(c);
        format!("{c}={} (settled through {})", balance.accumulated(), balance.last_settled_epoch())
    };
    format!(
        "{entity} epoch={} {} {}",
        record.max_reported_epoch(),
        category(BillingCategory::Primary),
        category(BillingCategory::Secondary),
    )
}
