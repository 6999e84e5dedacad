use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fuelrs::depletion::process_records;
use fuelrs::ledger::{build_ledger, DayInput, LedgerContext, LedgerDay};
use fuelrs::models::{IntakeRecord, Sport, SubjectSettings, TrainingRecord};
use fuelrs::scoring::readiness_score;
use fuelrs::thresholds::round_half_up;

/// Property-based checks of the ledger fold over random inputs

#[derive(Debug, Clone)]
struct DayPlan {
    tss: Option<u32>,
    calories: Option<u32>,
    carbs: Option<u32>,
}

fn day_plan() -> impl Strategy<Value = DayPlan> {
    (
        proptest::option::of(0u32..450),
        proptest::option::of(0u32..3000),
        proptest::option::of(0u32..1200),
    )
        .prop_map(|(tss, calories, carbs)| DayPlan {
            tss,
            calories,
            carbs,
        })
}

fn run_ledger(weight: u32, starting_debt: Option<u32>, plans: &[DayPlan]) -> Vec<LedgerDay> {
    let settings = SubjectSettings {
        weight_kg: Some(f64::from(weight)),
        starting_debt_g: starting_debt.map(f64::from),
        ..Default::default()
    }
    .resolve();
    let hr_max = settings.hr_max;
    let ctx = LedgerContext::new(settings);
    let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let days: Vec<DayInput> = plans
        .iter()
        .enumerate()
        .map(|(i, plan)| {
            let date = first + Duration::days(i as i64);
            let records = match plan.tss {
                Some(tss) => {
                    let mut record = TrainingRecord::new(date, Sport::Bike);
                    record.tss = Some(Decimal::from(tss));
                    record.calories = plan.calories;
                    record.duration_min = Some(dec!(60));
                    process_records(vec![record], hr_max)
                }
                None => Vec::new(),
            };
            DayInput {
                date,
                records,
                intake: plan.carbs.map(|carbs| IntakeRecord {
                    date,
                    carbs_g: Some(Decimal::from(carbs)),
                    protein_g: Some(dec!(100)),
                }),
            }
        })
        .collect();

    build_ledger(&ctx, &days)
}

proptest! {
    #[test]
    fn test_store_chain_is_continuous(
        weight in 40u32..120,
        starting_debt in proptest::option::of(0u32..1000),
        plans in proptest::collection::vec(day_plan(), 1..40)
    ) {
        let ledger = run_ledger(weight, starting_debt, &plans);
        prop_assert_eq!(ledger.len(), plans.len());

        for pair in ledger.windows(2) {
            prop_assert_eq!(pair[0].entry.store_end_g, pair[1].entry.store_start_g);
        }
        for day in &ledger {
            prop_assert!(day.entry.store_end_g >= Decimal::ZERO);
            prop_assert!(day.entry.store_end_g <= day.entry.supercomp_cap_g);
        }
    }

    #[test]
    fn test_targets_stay_within_weight_bounds(
        weight in 40u32..120,
        plans in proptest::collection::vec(day_plan(), 1..40)
    ) {
        let ledger = run_ledger(weight, None, &plans);
        let w = Decimal::from(weight);

        for day in &ledger {
            prop_assert!(day.entry.carb_target_g >= w * dec!(2));
            prop_assert!(day.entry.carb_target_g <= w * dec!(8));
            prop_assert!(day.entry.protein_target_g >= round_half_up(w * dec!(1.6)));
            prop_assert!(day.entry.protein_target_g <= round_half_up(w * dec!(2.2)));
        }
    }

    #[test]
    fn test_legacy_debt_is_bounded(
        weight in 40u32..120,
        starting_debt in proptest::option::of(0u32..2000),
        plans in proptest::collection::vec(day_plan(), 1..40)
    ) {
        let ledger = run_ledger(weight, starting_debt, &plans);
        for day in &ledger {
            for debt in [day.entry.debt_start_g, day.entry.debt_end_g] {
                prop_assert!(debt >= dec!(-150) && debt <= dec!(900));
            }
        }
    }

    #[test]
    fn test_readiness_non_decreasing(fill in 0u32..200) {
        prop_assert!(readiness_score(fill) <= readiness_score(fill + 1));
    }

    #[test]
    fn test_zero_activity_day_keeps_store(
        weight in 40u32..120,
        plans in proptest::collection::vec(day_plan(), 1..20)
    ) {
        let mut plans = plans;
        plans.push(DayPlan { tss: None, calories: None, carbs: Some(0) });

        let ledger = run_ledger(weight, None, &plans);
        let last = ledger.last().unwrap();
        prop_assert_eq!(last.entry.store_end_g, last.entry.store_start_g);
    }

    #[test]
    fn test_rerun_is_byte_identical(
        weight in 40u32..120,
        plans in proptest::collection::vec(day_plan(), 1..30)
    ) {
        let first = serde_json::to_string(&run_ledger(weight, None, &plans)).unwrap();
        let second = serde_json::to_string(&run_ledger(weight, None, &plans)).unwrap();
        prop_assert_eq!(first, second);
    }
}
