//! Per-record glycogen depletion and intensity classification
//!
//! Both estimators are pure functions of a single [`TrainingRecord`], so a
//! batch of records can be processed in parallel and reassembled in input
//! order before the ledger consumes them.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    DepletionMethod, IntensityBucket, IntensitySource, RecordDerivation, Sport, TrainingRecord,
};
use crate::thresholds::{
    clamp, round_half_up, Band, ThresholdTable, CALORIE_CLAMP_HIGH, CALORIE_CLAMP_LOW,
    CALORIE_DEPLETION_MULTIPLIER, TSS_DEPLETION_MULTIPLIER,
};
use rust_decimal_macros::dec;

/// Intensity factor bands: `< 0.75` easy, `< 0.88` moderate, else hard
pub const IF_BUCKETS: ThresholdTable<Decimal, IntensityBucket> = ThresholdTable::new(
    &[
        Band::at_least(dec!(0.88), IntensityBucket::Hard),
        Band::at_least(dec!(0.75), IntensityBucket::Moderate),
    ],
    IntensityBucket::Easy,
);

/// Heart-rate ratio bands: `< 0.75` easy, `<= 0.85` moderate, else hard
pub const HR_BUCKETS: ThresholdTable<Decimal, IntensityBucket> = ThresholdTable::new(
    &[
        Band::above(dec!(0.85), IntensityBucket::Hard),
        Band::at_least(dec!(0.75), IntensityBucket::Moderate),
    ],
    IntensityBucket::Easy,
);

/// Depletion estimate for one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepletionEstimate {
    pub depletion_g: Decimal,
    pub method: DepletionMethod,
}

/// Estimate glycogen depletion from training stress, bounded by calories when known
pub fn estimate_depletion(record: &TrainingRecord) -> DepletionEstimate {
    let from_stress = record
        .tss
        .and_then(|tss| tss.checked_mul(TSS_DEPLETION_MULTIPLIER))
        .unwrap_or(Decimal::ZERO);

    match record.calories.filter(|&c| c > 0) {
        Some(calories) => {
            let from_calories = Decimal::from(calories) * CALORIE_DEPLETION_MULTIPLIER;
            let depletion = clamp(
                from_stress,
                from_calories * CALORIE_CLAMP_LOW,
                from_calories * CALORIE_CLAMP_HIGH,
            );
            DepletionEstimate {
                depletion_g: round_half_up(depletion),
                method: DepletionMethod::TssClampedByCal,
            }
        }
        None => DepletionEstimate {
            depletion_g: round_half_up(from_stress),
            method: DepletionMethod::TssOnly,
        },
    }
}

/// Bucket a record by intensity factor, falling back to heart rate
pub fn classify_intensity(
    record: &TrainingRecord,
    hr_max: Decimal,
) -> (IntensityBucket, IntensitySource) {
    if let Some(intensity_factor) = record.intensity_factor.filter(|v| *v > Decimal::ZERO) {
        return (IF_BUCKETS.classify(intensity_factor), IntensitySource::If);
    }

    if let Some(avg_hr) = record.avg_hr.filter(|&hr| hr > 0) {
        if hr_max > Decimal::ZERO {
            let ratio = Decimal::from(avg_hr) / hr_max;
            return (HR_BUCKETS.classify(ratio), IntensitySource::Hr);
        }
    }

    (IntensityBucket::Unknown, IntensitySource::Unknown)
}

/// Derive depletion and intensity fields for a single record
pub fn derive_record(record: &TrainingRecord, hr_max: Decimal) -> RecordDerivation {
    let estimate = estimate_depletion(record);
    let (intensity_bucket, intensity_source) = classify_intensity(record, hr_max);

    RecordDerivation {
        depletion_g: estimate.depletion_g,
        depletion_method: estimate.method,
        intensity_bucket,
        intensity_source,
    }
}

/// Process a batch of records in parallel, preserving input order
pub fn process_records(records: Vec<TrainingRecord>, hr_max: Decimal) -> Vec<TrainingRecord> {
    records
        .into_par_iter()
        .map(|mut record| {
            record.derived = Some(derive_record(&record, hr_max));
            record
        })
        .collect()
}

/// Count of records per intensity bucket on one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityMix {
    pub easy: u16,
    pub moderate: u16,
    pub hard: u16,
    pub unknown: u16,
}

impl IntensityMix {
    pub fn from_records(records: &[TrainingRecord]) -> Self {
        records.iter().fold(IntensityMix::default(), |mut mix, record| {
            let bucket = record
                .derived
                .as_ref()
                .map(|d| d.intensity_bucket)
                .unwrap_or(IntensityBucket::Unknown);
            match bucket {
                IntensityBucket::Easy => mix.easy += 1,
                IntensityBucket::Moderate => mix.moderate += 1,
                IntensityBucket::Hard => mix.hard += 1,
                IntensityBucket::Unknown => mix.unknown += 1,
            }
            mix
        })
    }
}

/// Aggregated training load for one calendar day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayLoad {
    pub depletion_total_g: Decimal,
    pub total_tss: Decimal,
    pub total_duration_min: Decimal,
    pub workout_count: u16,
    pub intensity_mix: IntensityMix,
    /// Minutes per sport
    pub sport_mix: BTreeMap<Sport, Decimal>,
}

impl DayLoad {
    /// Sum one day's processed records
    pub fn from_records(records: &[TrainingRecord]) -> Self {
        let mut sport_mix: BTreeMap<Sport, Decimal> = BTreeMap::new();
        for record in records {
            *sport_mix.entry(record.sport).or_insert(Decimal::ZERO) +=
                record.duration_min.unwrap_or(Decimal::ZERO);
        }

        DayLoad {
            depletion_total_g: records.iter().map(TrainingRecord::depletion_g).sum(),
            total_tss: records.iter().filter_map(|r| r.tss).sum(),
            total_duration_min: records.iter().filter_map(|r| r.duration_min).sum(),
            workout_count: u16::try_from(records.len()).unwrap_or(u16::MAX),
            intensity_mix: IntensityMix::from_records(records),
            sport_mix,
        }
    }

    pub fn is_rest_day(&self) -> bool {
        self.workout_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> TrainingRecord {
        TrainingRecord::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), Sport::Bike)
    }

    #[test]
    fn test_depletion_from_tss_only() {
        let mut r = record();
        r.tss = Some(dec!(100));

        let estimate = estimate_depletion(&r);
        assert_eq!(estimate.depletion_g, dec!(120));
        assert_eq!(estimate.method, DepletionMethod::TssOnly);
    }

    #[test]
    fn test_depletion_clamped_by_calories() {
        // 800 kcal -> 160 g, band [112, 208]; tss 200 -> 240 g clamps to 208
        let mut r = record();
        r.tss = Some(dec!(200));
        r.calories = Some(800);

        let estimate = estimate_depletion(&r);
        assert_eq!(estimate.depletion_g, dec!(208));
        assert_eq!(estimate.method, DepletionMethod::TssClampedByCal);

        // Low stress is raised to the lower bound
        r.tss = Some(dec!(20));
        assert_eq!(estimate_depletion(&r).depletion_g, dec!(112));

        // Missing stress still gets the calorie floor
        r.tss = None;
        assert_eq!(estimate_depletion(&r).depletion_g, dec!(112));
    }

    #[test]
    fn test_depletion_without_signal_is_zero() {
        let estimate = estimate_depletion(&record());
        assert_eq!(estimate.depletion_g, Decimal::ZERO);
        assert_eq!(estimate.method, DepletionMethod::TssOnly);

        let mut r = record();
        r.calories = Some(0);
        assert_eq!(estimate_depletion(&r).depletion_g, Decimal::ZERO);
    }

    #[test]
    fn test_depletion_with_overflowing_tss_is_zero() {
        let mut r = record();
        r.tss = Some(Decimal::MAX);

        let estimate = estimate_depletion(&r);
        assert_eq!(estimate.depletion_g, Decimal::ZERO);
        assert_eq!(estimate.method, DepletionMethod::TssOnly);
    }

    #[test]
    fn test_workout_count_saturates() {
        let records = vec![record(); usize::from(u16::MAX) + 5];
        let load = DayLoad::from_records(&records);
        assert_eq!(load.workout_count, u16::MAX);
        assert!(!load.is_rest_day());
    }

    #[test]
    fn test_intensity_from_intensity_factor() {
        let mut r = record();
        r.avg_hr = Some(175);

        r.intensity_factor = Some(dec!(0.74));
        assert_eq!(
            classify_intensity(&r, dec!(180)),
            (IntensityBucket::Easy, IntensitySource::If)
        );
        r.intensity_factor = Some(dec!(0.75));
        assert_eq!(classify_intensity(&r, dec!(180)).0, IntensityBucket::Moderate);
        r.intensity_factor = Some(dec!(0.88));
        assert_eq!(classify_intensity(&r, dec!(180)).0, IntensityBucket::Hard);
    }

    #[test]
    fn test_intensity_falls_back_to_heart_rate() {
        let mut r = record();
        r.intensity_factor = Some(Decimal::ZERO);

        r.avg_hr = Some(130); // 0.72
        assert_eq!(
            classify_intensity(&r, dec!(180)),
            (IntensityBucket::Easy, IntensitySource::Hr)
        );
        r.avg_hr = Some(153); // exactly 0.85
        assert_eq!(classify_intensity(&r, dec!(180)).0, IntensityBucket::Moderate);
        r.avg_hr = Some(160); // 0.89
        assert_eq!(classify_intensity(&r, dec!(180)).0, IntensityBucket::Hard);
    }

    #[test]
    fn test_intensity_unknown_without_signal() {
        assert_eq!(
            classify_intensity(&record(), dec!(180)),
            (IntensityBucket::Unknown, IntensitySource::Unknown)
        );
    }

    #[test]
    fn test_process_records_preserves_order() {
        let records: Vec<TrainingRecord> = (0..50)
            .map(|i| {
                let mut r = record();
                r.id = format!("r{}", i);
                r.tss = Some(Decimal::from(i));
                r
            })
            .collect();

        let processed = process_records(records, dec!(180));
        for (i, r) in processed.iter().enumerate() {
            assert_eq!(r.id, format!("r{}", i));
            assert!(r.derived.is_some());
        }
    }

    #[test]
    fn test_day_load_aggregation() {
        let mut ride = record();
        ride.tss = Some(dec!(60));
        ride.duration_min = Some(dec!(90));
        ride.intensity_factor = Some(dec!(0.8));

        let mut run = record();
        run.sport = Sport::Run;
        run.tss = Some(dec!(40));
        run.duration_min = Some(dec!(45));

        let processed = process_records(vec![ride, run], dec!(180));
        let load = DayLoad::from_records(&processed);

        assert_eq!(load.depletion_total_g, dec!(120));
        assert_eq!(load.total_tss, dec!(100));
        assert_eq!(load.total_duration_min, dec!(135));
        assert_eq!(load.workout_count, 2);
        assert_eq!(load.intensity_mix.moderate, 1);
        assert_eq!(load.intensity_mix.unknown, 1);
        assert_eq!(load.intensity_mix.hard, 0);
        assert_eq!(load.sport_mix.get(&Sport::Bike), Some(&dec!(90)));
        assert!(!load.is_rest_day());
        assert!(DayLoad::from_records(&[]).is_rest_day());
    }
}
