use std::collections::HashMap;

use proptest::prelude::*;
use tally_ledger::{Roles, SettlementOutcome, UsageLedger};
use tally_primitives::{Amount, BillingCategory, EntityId, Epoch, U256};
use tally_test_utils::{MockRails, TestConfig, admin, reporter};

const ENTITIES: u64 = 3;

#[derive(Debug, Clone)]
enum Op {
    Report { entity: u64, step: u64, primary: u64, secondary: u64 },
    Settle { category: BillingCategory, entities: Vec<u64> },
    TopUp { entity: u64, category: BillingCategory, amount: u64 },
}

fn category() -> impl Strategy<Value = BillingCategory> {
    prop_oneof![Just(BillingCategory::Primary), Just(BillingCategory::Secondary)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=ENTITIES, 0..3u64, 0..10_000u64, 0..10_000u64).prop_map(
            |(entity, step, primary, secondary)| Op::Report { entity, step, primary, secondary }
        ),
        2 => (category(), prop::collection::vec(1..=ENTITIES + 1, 0..4))
            .prop_map(|(category, entities)| Op::Settle { category, entities }),
        1 => (1..=ENTITIES, category(), 0..2_000_000u64)
            .prop_map(|(entity, category, amount)| Op::TopUp { entity, category, amount }),
    ]
}

fn new_ledger() -> UsageLedger<MockRails> {
    let roles = Roles::new(admin(), reporter()).expect("valid roles");
    let ledger =
        UsageLedger::new(&TestConfig::default(), roles, MockRails::new()).expect("valid config");
    for entity in 1..=ENTITIES {
        for category in BillingCategory::ALL {
            ledger.rails().open_rail(EntityId::new(entity), category, U256::from(50_000u64));
        }
    }
    ledger
}

fn amount(value: u64) -> Amount {
    U256::from(value)
}

proptest! {
    /// Accepted epochs strictly increase per entity; everything else is rejected
    /// without touching the record.
    #[test]
    fn epochs_strictly_increase(epochs in prop::collection::vec(0..20u64, 1..30)) {
        let mut ledger = new_ledger();
        let entity = EntityId::new(1);
        let mut max_reported: Epoch = 0;

        for epoch in epochs {
            let before = ledger.record(entity);
            let result = ledger.record_usage(reporter(), entity, epoch, 1, 1);
            if epoch > max_reported {
                prop_assert!(result.is_ok());
                max_reported = epoch;
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(ledger.record(entity), before);
            }
            prop_assert_eq!(ledger.record(entity).max_reported_epoch(), max_reported);
        }
    }

    /// Reported amounts are conserved: everything converted is either still
    /// accumulated or was applied against a rail. Settlement never exceeds the
    /// lockup or the accumulated amount, never moves settled epochs past the
    /// reported high-water mark, and never touches the other category.
    #[test]
    fn settlement_conserves_and_is_bounded(ops in prop::collection::vec(op(), 1..60)) {
        let mut ledger = new_ledger();
        let mut reported: HashMap<(EntityId, BillingCategory), Amount> = HashMap::new();

        for op in ops {
            match op {
                Op::Report { entity, step, primary, secondary } => {
                    let entity = EntityId::new(entity);
                    let epoch = ledger.record(entity).max_reported_epoch() + step;
                    if ledger.record_usage(reporter(), entity, epoch, primary, secondary).is_ok() {
                        *reported.entry((entity, BillingCategory::Primary)).or_default() +=
                            amount(primary) * amount(100);
                        *reported.entry((entity, BillingCategory::Secondary)).or_default() +=
                            amount(secondary) * amount(200);
                    }
                }
                Op::Settle { category, entities } => {
                    let entities: Vec<_> = entities.into_iter().map(EntityId::new).collect();
                    let before: HashMap<_, _> =
                        entities.iter().map(|&e| (e, ledger.record(e))).collect();
                    let lockups: HashMap<_, _> = entities
                        .iter()
                        .map(|&e| (e, lockup(&ledger, e, category)))
                        .collect();

                    let report = ledger.settle(category, &entities).expect("skip policy never fails");

                    for (entity, outcome) in report.outcomes() {
                        if let SettlementOutcome::Settled { amount, .. } = outcome {
                            let record = before[entity];
                            prop_assert!(*amount <= record.accumulated(category));
                            prop_assert!(*amount <= lockups[entity]);
                        }
                    }
                    for &entity in &entities {
                        let record = ledger.record(entity);
                        prop_assert_eq!(
                            record.balance(category.other()),
                            before[&entity].balance(category.other())
                        );
                        prop_assert!(record.last_settled_epoch(category) <= record.max_reported_epoch());
                    }
                }
                Op::TopUp { entity, category, amount: value } => {
                    ledger
                        .rails()
                        .top_up(EntityId::new(entity), category, amount(value))
                        .expect("rails opened for every entity");
                }
            }
        }

        for entity in 1..=ENTITIES {
            let entity = EntityId::new(entity);
            for category in BillingCategory::ALL {
                let total = reported.get(&(entity, category)).copied().unwrap_or_default();
                let applied = ledger.rails().applied_total(entity, category);
                prop_assert_eq!(ledger.record(entity).accumulated(category) + applied, total);
            }
        }
    }

    /// Settling twice with no new usage and no lockup change is a no-op.
    #[test]
    fn repeated_settlement_is_noop(
        primary in 0..10_000u64,
        secondary in 0..10_000u64,
        category in category(),
    ) {
        let mut ledger = new_ledger();
        let entity = EntityId::new(2);
        ledger.record_usage(reporter(), entity, 1, primary, secondary).expect("valid report");

        ledger.settle(category, &[entity]).expect("first settlement");
        let record = ledger.record(entity);
        let applied = ledger.rails().applied();

        let report = ledger.settle(category, &[entity]).expect("second settlement");
        prop_assert_eq!(report.settled_count(), 0);
        prop_assert_eq!(ledger.record(entity), record);
        prop_assert_eq!(ledger.rails().applied(), applied);
    }
}

fn lockup(ledger: &UsageLedger<MockRails>, entity: EntityId, category: BillingCategory) -> Amount {
    use tally_api::PaymentRails;

    match ledger.rails().rail_id(entity, category) {
        Ok(Some(rail)) => ledger.rails().lockup_limit(rail).unwrap_or_default(),
        _ => U256::ZERO,
    }
}
