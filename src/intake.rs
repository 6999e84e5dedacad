//! Nutrition intake resolution and glycogen repletion
//!
//! Every ledger day gets a defined repletion value: a logged intake row is
//! used as-is, a missing row is estimated from the day's carb target, and a
//! day with neither contributes nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::IntakeRecord;
use crate::thresholds::{
    round_half_up, DEFAULT_INTAKE_RATIO, REPLETION_CAP_PER_DAY, REPLETION_EFFICIENCY,
};

/// Where a day's intake figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeType {
    Logged,
    Estimated,
    None,
}

impl fmt::Display for IntakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeType::Logged => write!(f, "logged"),
            IntakeType::Estimated => write!(f, "estimated"),
            IntakeType::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeConfidence {
    High,
    Low,
}

/// Resolved intake for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIntake {
    pub has_intake: bool,
    pub intake_type: IntakeType,
    pub confidence: IntakeConfidence,
    /// Carbohydrate figure for the day (the estimate on estimated days)
    pub carbs_logged_g: Decimal,
    pub protein_logged_g: Decimal,
    pub estimated_intake_g: Option<Decimal>,
    pub repletion_g: Decimal,
}

/// Glycogen restored by eating `carbs_g` grams of carbohydrate
pub fn calculate_repletion(carbs_g: Decimal) -> Decimal {
    if carbs_g <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (carbs_g * REPLETION_EFFICIENCY).min(REPLETION_CAP_PER_DAY)
}

/// Decide whether the day's intake is logged, estimated or unknown
pub fn resolve_intake(intake: Option<&IntakeRecord>, carb_target: Decimal) -> ResolvedIntake {
    if let Some(record) = intake {
        let carbs = record.carbs_g.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        let protein = record.protein_g.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        return ResolvedIntake {
            has_intake: true,
            intake_type: IntakeType::Logged,
            confidence: IntakeConfidence::High,
            carbs_logged_g: carbs,
            protein_logged_g: protein,
            estimated_intake_g: None,
            repletion_g: calculate_repletion(carbs),
        };
    }

    if carb_target > Decimal::ZERO {
        let estimated = round_half_up(carb_target * DEFAULT_INTAKE_RATIO);
        return ResolvedIntake {
            has_intake: false,
            intake_type: IntakeType::Estimated,
            confidence: IntakeConfidence::Low,
            carbs_logged_g: estimated,
            protein_logged_g: Decimal::ZERO,
            estimated_intake_g: Some(estimated),
            repletion_g: calculate_repletion(estimated),
        };
    }

    ResolvedIntake {
        has_intake: false,
        intake_type: IntakeType::None,
        confidence: IntakeConfidence::Low,
        carbs_logged_g: Decimal::ZERO,
        protein_logged_g: Decimal::ZERO,
        estimated_intake_g: None,
        repletion_g: Decimal::ZERO,
    }
}
