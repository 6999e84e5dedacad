//! Glycogen store ledger
//!
//! The ledger is a two-pass pipeline over a window of calendar days.
//!
//! Pass one is a strict chronological fold: [`step`] takes the previous
//! day's [`LedgerState`] and one [`DayInput`] and returns that day's
//! [`LedgerEntry`] together with the state carried into the next day. The
//! store level is the only carried quantity; deficit, surplus, fill and the
//! legacy debt view are projections of it.
//!
//! Pass two ([`annotate`]) reads the finished entry array and appends the
//! fields that need neighbouring days (trend, hard-tomorrow, back-to-back
//! and the insight text) without touching pass-one values.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::depletion::{DayLoad, IntensityMix};
use crate::error::LedgerError;
use crate::insights::{generate_day_insights, DayInsights, InsightFlags};
use crate::intake::{resolve_intake, IntakeConfidence, IntakeType};
use crate::models::{IntakeRecord, ResolvedSettings, Sport, TrainingRecord};
use crate::scoring::{is_hard_day, readiness_score, risk_flag, AlignmentGrade, RiskFlag};
use crate::targets::{
    calculate_carb_target, calculate_protein_target, derive_store_metrics, legacy_debt,
    CarbTargetInput, StoreBounds,
};
use crate::thresholds::{clamp, TREND_DEAD_BAND, TREND_WINDOW};
use crate::trend::{classify_debt_trend, DebtTrend};

/// Run-wide constants for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerContext {
    pub settings: ResolvedSettings,
    pub bounds: StoreBounds,
    pub protein_target_g: Decimal,
}

impl LedgerContext {
    pub fn new(settings: ResolvedSettings) -> Self {
        let bounds = StoreBounds::from_settings(&settings);
        let protein_target_g =
            calculate_protein_target(settings.weight_kg, settings.protein_g_per_kg);
        LedgerContext {
            settings,
            bounds,
            protein_target_g,
        }
    }

    /// State carried into the first day of the window
    pub fn initial_state(&self) -> LedgerState {
        LedgerState {
            store_g: self.bounds.initial_store(self.settings.starting_debt_g),
        }
    }
}

/// State carried between days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerState {
    pub store_g: Decimal,
}

/// Everything the fold needs for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayInput {
    pub date: NaiveDate,
    /// Training records already processed for depletion and intensity
    pub records: Vec<TrainingRecord>,
    pub intake: Option<IntakeRecord>,
}

impl DayInput {
    pub fn rest(date: NaiveDate) -> Self {
        DayInput {
            date,
            records: Vec::new(),
            intake: None,
        }
    }
}

/// Pass-one output for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,

    pub capacity_g: Decimal,
    pub supercomp_cap_g: Decimal,

    pub store_start_g: Decimal,
    pub store_end_g: Decimal,
    pub deficit_start_g: Decimal,
    pub surplus_start_g: Decimal,
    pub fill_pct_start: u32,
    pub deficit_end_g: Decimal,
    pub surplus_end_g: Decimal,
    pub fill_pct_end: u32,

    /// Legacy debt projections, bounded to `[-150, 900]`
    pub debt_start_g: Decimal,
    pub debt_end_g: Decimal,

    pub depletion_total_g: Decimal,
    pub total_tss: Decimal,
    pub total_duration_min: Decimal,
    pub workout_count: u16,
    pub is_rest_day: bool,
    pub intensity_mix: IntensityMix,
    pub sport_mix: BTreeMap<Sport, Decimal>,

    pub carb_target_g: Decimal,
    pub protein_target_g: Decimal,

    pub has_intake: bool,
    pub intake_type: IntakeType,
    pub intake_confidence: IntakeConfidence,
    pub carbs_logged_g: Decimal,
    pub protein_logged_g: Decimal,
    pub estimated_intake_g: Option<Decimal>,
    pub repletion_g: Decimal,

    pub is_hard_day: bool,
    /// Only scored when intake was actually logged
    pub alignment_score: Option<u8>,
    /// Component scores and badge behind `alignment_score`
    #[serde(default)]
    pub alignment_grade: Option<AlignmentGrade>,
    pub readiness_score: u8,
    pub risk_flag: RiskFlag,
}

impl LedgerEntry {
    pub fn store_delta_g(&self) -> Decimal {
        self.store_end_g - self.store_start_g
    }

    /// Carbohydrate still missing against the day's target
    pub fn missed_carbs_g(&self) -> Decimal {
        (self.carb_target_g - self.carbs_logged_g).max(Decimal::ZERO)
    }
}

impl AsRef<LedgerEntry> for LedgerEntry {
    fn as_ref(&self) -> &LedgerEntry {
        self
    }
}

/// Advance the ledger by one day
pub fn step(ctx: &LedgerContext, state: LedgerState, input: &DayInput) -> (LedgerEntry, LedgerState) {
    let bounds = ctx.bounds;
    let weight_kg = ctx.settings.weight_kg;

    let store_start = state.store_g;
    let load = DayLoad::from_records(&input.records);
    let start = derive_store_metrics(store_start, bounds.capacity_g);

    let carb_target = calculate_carb_target(CarbTargetInput {
        weight_kg,
        depletion_total_g: load.depletion_total_g,
        deficit_g: start.deficit_g,
        surplus_g: start.surplus_g,
    })
    .target_g;

    let intake = resolve_intake(input.intake.as_ref(), carb_target);

    let store_end = clamp(
        store_start - load.depletion_total_g + intake.repletion_g,
        Decimal::ZERO,
        bounds.supercomp_cap_g,
    );
    let end = derive_store_metrics(store_end, bounds.capacity_g);

    let alignment = match intake.intake_type {
        IntakeType::Logged => Some(AlignmentGrade::grade(
            intake.carbs_logged_g,
            carb_target,
            intake.protein_logged_g,
            ctx.protein_target_g,
        )),
        _ => None,
    };

    let entry = LedgerEntry {
        date: input.date,
        capacity_g: bounds.capacity_g,
        supercomp_cap_g: bounds.supercomp_cap_g,
        store_start_g: store_start,
        store_end_g: store_end,
        deficit_start_g: start.deficit_g,
        surplus_start_g: start.surplus_g,
        fill_pct_start: start.fill_pct,
        deficit_end_g: end.deficit_g,
        surplus_end_g: end.surplus_g,
        fill_pct_end: end.fill_pct,
        debt_start_g: legacy_debt(bounds.capacity_g, store_start),
        debt_end_g: legacy_debt(bounds.capacity_g, store_end),
        is_hard_day: is_hard_day(load.total_tss, load.depletion_total_g, &input.records),
        is_rest_day: load.is_rest_day(),
        depletion_total_g: load.depletion_total_g,
        total_tss: load.total_tss,
        total_duration_min: load.total_duration_min,
        workout_count: load.workout_count,
        intensity_mix: load.intensity_mix,
        sport_mix: load.sport_mix,
        carb_target_g: carb_target,
        protein_target_g: ctx.protein_target_g,
        has_intake: intake.has_intake,
        intake_type: intake.intake_type,
        intake_confidence: intake.confidence,
        carbs_logged_g: intake.carbs_logged_g,
        protein_logged_g: intake.protein_logged_g,
        estimated_intake_g: intake.estimated_intake_g,
        repletion_g: intake.repletion_g,
        alignment_score: alignment.map(|grade| grade.overall),
        alignment_grade: alignment,
        readiness_score: readiness_score(end.fill_pct),
        risk_flag: risk_flag(end.fill_pct),
    };

    (entry, LedgerState { store_g: store_end })
}

/// Run pass one over days in chronological order
///
/// `before_day` is called with the day index and date before each day is
/// computed; returning an error stops the fold at that boundary.
pub fn fold_days<F>(
    ctx: &LedgerContext,
    days: &[DayInput],
    mut before_day: F,
) -> Result<Vec<LedgerEntry>, LedgerError>
where
    F: FnMut(usize, NaiveDate) -> Result<(), LedgerError>,
{
    let mut entries = Vec::with_capacity(days.len());
    let mut state = ctx.initial_state();

    for (index, input) in days.iter().enumerate() {
        before_day(index, input.date)?;
        let (entry, next) = step(ctx, state, input);
        entries.push(entry);
        state = next;
    }

    Ok(entries)
}

/// Fully derived ledger day: pass-one entry plus neighbour-dependent fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDay {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub debt_trend: DebtTrend,
    pub is_hard_tomorrow: bool,
    pub is_back_to_back: bool,
    #[serde(flatten)]
    pub insights: DayInsights,
}

impl AsRef<LedgerEntry> for LedgerDay {
    fn as_ref(&self) -> &LedgerEntry {
        &self.entry
    }
}

impl LedgerDay {
    pub fn date(&self) -> NaiveDate {
        self.entry.date
    }
}

/// Pass two for the entry at `index`
pub fn annotate(entries: &[LedgerEntry], index: usize, dead_band: Decimal) -> LedgerDay {
    let entry = &entries[index];
    let window_start = (index + 1).saturating_sub(TREND_WINDOW);
    let debts: Vec<Decimal> = entries[window_start..=index]
        .iter()
        .map(|e| e.debt_end_g)
        .collect();

    let debt_trend = classify_debt_trend(&debts, dead_band);
    let is_hard_tomorrow = entries
        .get(index + 1)
        .map(|next| next.is_hard_day)
        .unwrap_or(false);
    let is_back_to_back = index > 0 && entry.is_hard_day && entries[index - 1].is_hard_day;

    let insights = generate_day_insights(
        entry,
        InsightFlags {
            is_hard_tomorrow,
            is_back_to_back,
            debt_trend,
        },
    );

    LedgerDay {
        entry: entry.clone(),
        debt_trend,
        is_hard_tomorrow,
        is_back_to_back,
        insights,
    }
}

pub fn annotate_all(entries: &[LedgerEntry], dead_band: Decimal) -> Vec<LedgerDay> {
    (0..entries.len())
        .map(|index| annotate(entries, index, dead_band))
        .collect()
}

/// Both passes with no progress hook and the default trend dead band
pub fn build_ledger(ctx: &LedgerContext, days: &[DayInput]) -> Vec<LedgerDay> {
    let entries = days
        .iter()
        .scan(ctx.initial_state(), |state, input| {
            let (entry, next) = step(ctx, *state, input);
            *state = next;
            Some(entry)
        })
        .collect::<Vec<_>>();
    annotate_all(&entries, TREND_DEAD_BAND)
}

/// Every date in `[start, end]`, ascending
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += Duration::days(1);
    }
    dates
}

/// Group records and intake rows into one [`DayInput`] per date
///
/// Rows outside `dates` are ignored. When several intake rows share a
/// date the last one wins.
pub fn assemble_days(
    dates: &[NaiveDate],
    records: Vec<TrainingRecord>,
    intakes: Vec<IntakeRecord>,
) -> Vec<DayInput> {
    let mut by_date: BTreeMap<NaiveDate, DayInput> = dates
        .iter()
        .map(|&date| (date, DayInput::rest(date)))
        .collect();

    for record in records {
        if let Some(day) = by_date.get_mut(&record.date) {
            day.records.push(record);
        }
    }
    for intake in intakes {
        if let Some(day) = by_date.get_mut(&intake.date) {
            day.intake = Some(intake);
        }
    }

    by_date.into_values().collect()
}
