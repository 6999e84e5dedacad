//! Day scores: alignment, readiness, risk flag, hard-day check and what-if projection

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::TrainingRecord;
use crate::targets::{calculate_supercomp_cap, derive_store_metrics};
use crate::thresholds::{
    round_half_up, Band, ThresholdTable, ALIGNMENT_CARB_WEIGHT, ALIGNMENT_PROTEIN_WEIGHT,
    FILL_GREEN_MIN, FILL_ORANGE_MIN, FILL_SCORING_MAX, FILL_YELLOW_MIN, HARD_DAY_DEPLETION,
    HARD_DAY_INTENSITY_FACTOR, HARD_DAY_MIN_DURATION, HARD_DAY_TSS, REPLETION_EFFICIENCY,
    WHAT_IF_EXTRA_CARBS,
};

/// Traffic-light risk derived from fill percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskFlag {
    Green,
    Yellow,
    Orange,
    Red,
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFlag::Green => write!(f, "green"),
            RiskFlag::Yellow => write!(f, "yellow"),
            RiskFlag::Orange => write!(f, "orange"),
            RiskFlag::Red => write!(f, "red"),
        }
    }
}

pub const RISK_BANDS: ThresholdTable<u32, RiskFlag> = ThresholdTable::new(
    &[
        Band::at_least(FILL_GREEN_MIN, RiskFlag::Green),
        Band::at_least(FILL_YELLOW_MIN, RiskFlag::Yellow),
        Band::at_least(FILL_ORANGE_MIN, RiskFlag::Orange),
    ],
    RiskFlag::Red,
);

pub fn risk_flag(fill_pct: u32) -> RiskFlag {
    RISK_BANDS.classify(fill_pct)
}

/// Linear readiness segment: `base + span × (fill − lower) / width`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessSegment {
    pub width: Decimal,
    pub base: Decimal,
    pub span: Decimal,
}

impl ReadinessSegment {
    const fn new(width: Decimal, base: Decimal, span: Decimal) -> Self {
        ReadinessSegment { width, base, span }
    }
}

/// Piecewise-linear readiness mapping over fill `[0, 120]`
pub const READINESS_SEGMENTS: ThresholdTable<u32, (u32, ReadinessSegment)> = ThresholdTable::new(
    &[
        Band::at_least(100, (100, ReadinessSegment::new(dec!(20), dec!(95), dec!(5)))),
        Band::at_least(80, (80, ReadinessSegment::new(dec!(20), dec!(80), dec!(15)))),
        Band::at_least(60, (60, ReadinessSegment::new(dec!(20), dec!(60), dec!(20)))),
        Band::at_least(40, (40, ReadinessSegment::new(dec!(20), dec!(35), dec!(25)))),
    ],
    (0, ReadinessSegment::new(dec!(40), dec!(10), dec!(25))),
);

/// Readiness score 10..=100 from end-of-day fill percentage
pub fn readiness_score(fill_pct: u32) -> u8 {
    let fill = fill_pct.min(FILL_SCORING_MAX);
    let (lower, segment) = READINESS_SEGMENTS.classify(fill);
    let progress = Decimal::from(fill - lower) / segment.width;
    round_half_up(segment.base + segment.span * progress.min(Decimal::ONE))
        .to_u8()
        .unwrap_or(0)
}

fn component_score(actual: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (actual.max(Decimal::ZERO) / target * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
}

/// Weighted intake-vs-target score, 60% carbohydrate and 40% protein
pub fn alignment_score(
    carbs_logged_g: Decimal,
    carb_target_g: Decimal,
    protein_logged_g: Decimal,
    protein_target_g: Decimal,
) -> u8 {
    if carb_target_g <= Decimal::ZERO || protein_target_g <= Decimal::ZERO {
        return 0;
    }

    let carb = component_score(carbs_logged_g, carb_target_g);
    let protein = component_score(protein_logged_g, protein_target_g);
    round_half_up(ALIGNMENT_CARB_WEIGHT * carb + ALIGNMENT_PROTEIN_WEIGHT * protein)
        .to_u8()
        .unwrap_or(0)
}

/// Badge colour for an alignment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentBadge {
    Green,
    Yellow,
    Orange,
    Red,
}

impl fmt::Display for AlignmentBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentBadge::Green => write!(f, "green"),
            AlignmentBadge::Yellow => write!(f, "yellow"),
            AlignmentBadge::Orange => write!(f, "orange"),
            AlignmentBadge::Red => write!(f, "red"),
        }
    }
}

pub const ALIGNMENT_BADGES: ThresholdTable<u8, AlignmentBadge> = ThresholdTable::new(
    &[
        Band::at_least(90, AlignmentBadge::Green),
        Band::at_least(75, AlignmentBadge::Yellow),
        Band::at_least(50, AlignmentBadge::Orange),
    ],
    AlignmentBadge::Red,
);

const ALIGNMENT_DESCRIPTIONS: ThresholdTable<u8, &'static str> = ThresholdTable::new(
    &[
        Band::at_least(90, "Excellent"),
        Band::at_least(75, "Good"),
        Band::at_least(50, "Fair"),
        Band::above(0, "Needs improvement"),
    ],
    "No data",
);

/// Component and overall alignment scores with display grading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentGrade {
    pub carb_score: u8,
    pub protein_score: u8,
    pub overall: u8,
    pub badge: AlignmentBadge,
}

impl AlignmentGrade {
    pub fn grade(
        carbs_logged_g: Decimal,
        carb_target_g: Decimal,
        protein_logged_g: Decimal,
        protein_target_g: Decimal,
    ) -> Self {
        let overall = alignment_score(
            carbs_logged_g,
            carb_target_g,
            protein_logged_g,
            protein_target_g,
        );
        let to_score = |value: Decimal| round_half_up(value).to_u8().unwrap_or(0);

        AlignmentGrade {
            carb_score: to_score(component_score(carbs_logged_g, carb_target_g)),
            protein_score: to_score(component_score(protein_logged_g, protein_target_g)),
            overall,
            badge: ALIGNMENT_BADGES.classify(overall),
        }
    }

    pub fn description(&self) -> &'static str {
        ALIGNMENT_DESCRIPTIONS.classify(self.overall)
    }
}

/// A day is hard on high total stress, high depletion, or one long intense session
pub fn is_hard_day(
    total_tss: Decimal,
    depletion_total_g: Decimal,
    records: &[TrainingRecord],
) -> bool {
    if total_tss >= HARD_DAY_TSS || depletion_total_g >= HARD_DAY_DEPLETION {
        return true;
    }

    records.iter().any(|record| {
        let intense = record
            .intensity_factor
            .map(|v| v >= HARD_DAY_INTENSITY_FACTOR)
            .unwrap_or(false);
        let long = record
            .duration_min
            .map(|v| v >= HARD_DAY_MIN_DURATION)
            .unwrap_or(false);
        intense && long
    })
}

/// Store state after eating extra carbohydrate on top of the current store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhatIfProjection {
    pub extra_carbs_g: Decimal,
    pub store_after_g: Decimal,
    pub fill_pct_after: u32,
    pub readiness_after: u8,
    pub surplus_after_g: Decimal,
}

pub fn project_what_if(
    current_store_g: Decimal,
    capacity_g: Decimal,
    extra_carbs_g: Option<Decimal>,
) -> WhatIfProjection {
    let extra = extra_carbs_g.unwrap_or(WHAT_IF_EXTRA_CARBS).max(Decimal::ZERO);
    let store_after = (current_store_g + extra * REPLETION_EFFICIENCY)
        .min(calculate_supercomp_cap(capacity_g));
    let metrics = derive_store_metrics(store_after, capacity_g);

    WhatIfProjection {
        extra_carbs_g: extra,
        store_after_g: round_half_up(store_after),
        fill_pct_after: metrics.fill_pct,
        readiness_after: readiness_score(metrics.fill_pct),
        surplus_after_g: round_half_up(metrics.surplus_g),
    }
}
