use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fuelrs::database::{LedgerRepository, MemoryRepository};
use fuelrs::depletion::process_records;
use fuelrs::engine::{LedgerEngine, RecomputeOptions};
use fuelrs::ledger::{assemble_days, build_ledger, date_range, LedgerContext};
use fuelrs::models::{IntakeRecord, ResolvedSettings, Sport, TrainingRecord};

/// Benchmarks for the ledger fold and a full in-memory recompute
///
/// Windows of 30 days to three years check that both passes stay linear.

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn create_record_dataset(days: usize) -> Vec<TrainingRecord> {
    (0..days)
        .filter(|i| i % 7 != 6)
        .map(|i| {
            let date = start_date() + Duration::days(i as i64);
            let sport = if i % 2 == 0 { Sport::Run } else { Sport::Bike };
            let mut record = TrainingRecord::new(date, sport);
            record.tss = Some(Decimal::from(40 + (i % 5) as u32 * 25));
            record.duration_min = Some(dec!(75));
            record.intensity_factor = Some(dec!(0.70) + Decimal::from((i % 4) as u32) * dec!(0.07));
            record.calories = Some(600 + (i % 3) as u32 * 200);
            record
        })
        .collect()
}

fn create_intake_dataset(days: usize) -> Vec<IntakeRecord> {
    (0..days)
        .filter(|i| i % 3 != 0)
        .map(|i| IntakeRecord {
            date: start_date() + Duration::days(i as i64),
            carbs_g: Some(Decimal::from(250 + (i % 4) as u32 * 60)),
            protein_g: Some(dec!(130)),
        })
        .collect()
}

fn bench_ledger_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ledger Fold");
    let ctx = LedgerContext::new(ResolvedSettings::default());

    for &size in &[30usize, 90, 365, 1095] {
        let dates = date_range(start_date(), start_date() + Duration::days(size as i64 - 1));
        let records = process_records(create_record_dataset(size), ctx.settings.hr_max);
        let days = assemble_days(&dates, records, create_intake_dataset(size));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build_ledger", size), &days, |b, days| {
            b.iter(|| build_ledger(black_box(&ctx), black_box(days)));
        });
    }

    group.finish();
}

fn bench_record_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Record Processing");

    for &size in &[100usize, 1000, 10000] {
        let records = create_record_dataset(size);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("process_records", size),
            &records,
            |b, records| {
                b.iter(|| process_records(black_box(records.clone()), dec!(185)));
            },
        );
    }

    group.finish();
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("Recompute");
    group.sample_size(20);

    let size = 365usize;
    let mut repo = MemoryRepository::new();
    for record in create_record_dataset(size) {
        repo.store_training_record("bench", &record).unwrap();
    }
    for intake in create_intake_dataset(size) {
        repo.store_intake_record("bench", &intake).unwrap();
    }
    let mut engine = LedgerEngine::new(repo);
    let end = start_date() + Duration::days(size as i64 - 1);

    group.bench_function("memory_repository_365_days", |b| {
        b.iter(|| {
            engine
                .recompute(
                    "bench",
                    RecomputeOptions {
                        days: Some(size as u32 - 1),
                        end_date: Some(end),
                        ..Default::default()
                    },
                )
                .unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ledger_fold,
    bench_record_processing,
    bench_recompute
);
criterion_main!(benches);
