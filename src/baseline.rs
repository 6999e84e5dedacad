//! Detection of a training block already underway when history starts
//!
//! A fresh import starts the store at full capacity. If the first few days
//! already show heavy load the athlete was probably mid-block, and the user
//! is offered a chance to set a starting debt.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEntry;
use crate::models::ResolvedSettings;
use crate::thresholds::{
    round_half_up, BASELINE_DAYS, BASELINE_DEPLETION_THRESHOLD, BASELINE_TSS_THRESHOLD,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDetection {
    pub triggered: bool,
    pub reason: Option<String>,
    /// Summed training stress over the first days (rounded)
    pub tss_first_days: Decimal,
    /// Largest single-day depletion over the first days (rounded)
    pub max_depletion_g: Decimal,
}

impl BaselineDetection {
    fn quiet() -> Self {
        BaselineDetection {
            triggered: false,
            reason: None,
            tss_first_days: Decimal::ZERO,
            max_depletion_g: Decimal::ZERO,
        }
    }
}

/// Inspect the first chronological days of a ledger for heavy load
pub fn detect_ongoing_training_block<D: AsRef<LedgerEntry>>(days: &[D]) -> BaselineDetection {
    if days.len() < BASELINE_DAYS {
        return BaselineDetection::quiet();
    }

    let mut first: Vec<&LedgerEntry> = days.iter().map(AsRef::as_ref).collect();
    first.sort_by_key(|entry| entry.date);
    first.truncate(BASELINE_DAYS);

    let tss: Decimal = first.iter().map(|entry| entry.total_tss).sum();
    let max_depletion = first
        .iter()
        .map(|entry| entry.depletion_total_g)
        .max()
        .unwrap_or(Decimal::ZERO);

    let tss_first_days = round_half_up(tss);
    let max_depletion_g = round_half_up(max_depletion);

    let reason = if tss >= BASELINE_TSS_THRESHOLD {
        Some(format!(
            "High training load detected: {} TSS in first {} days",
            tss_first_days, BASELINE_DAYS
        ))
    } else if max_depletion >= BASELINE_DEPLETION_THRESHOLD {
        Some(format!(
            "Heavy session detected: {}g glycogen depletion in a single day",
            max_depletion_g
        ))
    } else {
        None
    };

    BaselineDetection {
        triggered: reason.is_some(),
        reason,
        tss_first_days,
        max_depletion_g,
    }
}

/// Whether to offer the starting-debt prompt for this subject
pub fn should_show_baseline_prompt(
    settings: &ResolvedSettings,
    detection: &BaselineDetection,
) -> bool {
    let has_starting_debt = settings
        .starting_debt_g
        .map(|debt| debt > Decimal::ZERO)
        .unwrap_or(false);

    detection.triggered && !has_starting_debt && !settings.baseline_prompt_dismissed
}
