//! Coaching text for a ledger day
//!
//! Each of the three strings is assembled from ordered rule tables: the
//! first matching tier supplies the main sentence, then optional clauses are
//! appended in a fixed order. Nothing here feeds back into the ledger.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::intake::IntakeType;
use crate::ledger::LedgerEntry;
use crate::thresholds::{
    round_half_up, round_to_nearest, Band, ThresholdTable, DEFAULT_INTAKE_RATIO, FILL_GREEN_MIN,
    FILL_LOADED_MIN, FILL_ORANGE_MIN, FILL_YELLOW_MIN,
};
use crate::trend::DebtTrend;

/// Neighbour-day facts computed in the second ledger pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightFlags {
    pub is_hard_tomorrow: bool,
    pub is_back_to_back: bool,
    pub debt_trend: DebtTrend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInsights {
    #[serde(rename = "insight_headline")]
    pub headline: String,
    #[serde(rename = "insight_action")]
    pub action: String,
    #[serde(rename = "insight_why")]
    pub why: String,
}

const STORE_DROP_THRESHOLD: Decimal = dec!(-120);
const STORE_GAIN_THRESHOLD: Decimal = dec!(50);
const SMALL_TOP_UP_MAX: Decimal = dec!(60);
const PRIORITY_TOP_UP_MAX: Decimal = dec!(200);
const LARGE_MISS_THRESHOLD: Decimal = dec!(100);

pub const HEADLINE_TIERS: ThresholdTable<u32, &'static str> = ThresholdTable::new(
    &[
        Band::at_least(FILL_LOADED_MIN, "Loaded and ready — buffer above baseline."),
        Band::at_least(FILL_GREEN_MIN, "Topped up — you're ready."),
        Band::at_least(FILL_YELLOW_MIN, "Slightly low — manageable today."),
        Band::at_least(FILL_ORANGE_MIN, "Compromised — fuel matters today."),
    ],
    "High risk — you're running on empty.",
);

pub fn build_headline(entry: &LedgerEntry) -> String {
    let mut headline = HEADLINE_TIERS.classify(entry.fill_pct_end).to_string();
    let delta = entry.store_delta_g();

    if delta < STORE_DROP_THRESHOLD {
        headline.push_str(" Stores dropped after back-to-back load.");
    } else if entry.repletion_g > entry.depletion_total_g && delta > STORE_GAIN_THRESHOLD {
        headline.push_str(" Nice — you built stores back up.");
    }

    headline
}

fn carb_guidance(entry: &LedgerEntry) -> String {
    let missed = entry.missed_carbs_g();

    if entry.surplus_end_g > Decimal::ZERO && missed <= Decimal::ZERO {
        "Maintain normal intake — your buffer handles the load.".to_string()
    } else if missed <= Decimal::ZERO {
        "You're on track — maintain current intake.".to_string()
    } else if missed <= SMALL_TOP_UP_MAX {
        format!("Small top-up: add ~{}g carbs today.", round_half_up(missed))
    } else if missed <= PRIORITY_TOP_UP_MAX {
        format!(
            "Priority: add ~{}g carbs by evening.",
            round_to_nearest(missed, dec!(25))
        )
    } else {
        format!(
            "Recovery push: aim for +{}g carbs across the day.",
            round_to_nearest(missed, dec!(50))
        )
    }
}

pub fn build_action(entry: &LedgerEntry, flags: InsightFlags) -> String {
    let mut action = carb_guidance(entry);
    action.push_str(&format!(
        " Protein: {}g (split across meals).",
        round_half_up(entry.protein_target_g)
    ));

    if entry.is_hard_day || flags.is_hard_tomorrow {
        action.push_str(" Front-load carbs earlier + include a carb snack after training.");
    } else if entry.is_rest_day && entry.surplus_end_g > Decimal::ZERO {
        action.push_str(" Rest day with buffer — steady intake is fine.");
    } else if entry.is_rest_day {
        action.push_str(" Steady carbs, focus on recovery.");
    }

    match entry.intake_type {
        IntakeType::Estimated => action.push_str(" Intake not logged; fueling is estimated."),
        IntakeType::None => action.push_str(" Intake unknown; repletion assumed minimal."),
        IntakeType::Logged => {}
    }

    action
}

/// One explanatory paragraph, chosen when `applies` is the first to match
pub struct WhyRule {
    pub name: &'static str,
    pub applies: fn(&LedgerEntry, InsightFlags) -> bool,
    pub text: fn(&LedgerEntry) -> String,
}

pub const WHY_RULES: &[WhyRule] = &[
    WhyRule {
        name: "surplus_buffer",
        applies: |entry, _| entry.surplus_end_g > Decimal::ZERO,
        text: |entry| {
            format!(
                "You have a {}g buffer above baseline ({}% fill). This buffer absorbs \
                 tomorrow's training cost before you dip into deficit. Great position — \
                 maintain steady intake.",
                round_half_up(entry.surplus_end_g),
                entry.fill_pct_end
            )
        },
    },
    WhyRule {
        name: "hard_day_low_fill",
        applies: |entry, _| entry.is_hard_day && entry.fill_pct_end < FILL_YELLOW_MIN,
        text: |_| {
            "Yesterday's load wasn't fully replaced, so you're carrying a deficit into \
             today. If you keep intensity high without topping up, quality and recovery \
             can stall."
                .to_string()
        },
    },
    WhyRule {
        name: "back_to_back",
        applies: |_, flags| flags.is_back_to_back,
        text: |_| {
            "This is a heavy block. Your body adapts when you replace the cost — \
             today's fueling is what protects tomorrow's session."
                .to_string()
        },
    },
    WhyRule {
        name: "replenishing",
        applies: |entry, _| entry.store_delta_g() > STORE_GAIN_THRESHOLD,
        text: |_| {
            "You're replenishing faster than you're spending — that's what 'good recovery' \
             looks like. Keep it steady and you'll be set up for the next hard effort."
                .to_string()
        },
    },
    WhyRule {
        name: "growing_deficit",
        applies: |entry, _| {
            entry.fill_pct_end < FILL_YELLOW_MIN && entry.missed_carbs_g() > LARGE_MISS_THRESHOLD
        },
        text: |_| {
            "You're running a deficit that's starting to add up. Consistent under-fueling \
             shows up as fatigue, poor sleep, and reduced training quality."
                .to_string()
        },
    },
];

const DEFAULT_WHY: &str = "Your glycogen stores are in a good range. Matching your targets \
                           today keeps you ready for whatever comes next.";

fn trend_sentence(trend: DebtTrend) -> &'static str {
    match trend {
        DebtTrend::Increasing => " 3-day debt trend is rising.",
        DebtTrend::Decreasing => " 3-day debt trend is improving.",
        DebtTrend::Stable => " 3-day debt trend is stable.",
    }
}

fn intake_caveat(entry: &LedgerEntry) -> Option<String> {
    match entry.intake_type {
        IntakeType::Estimated if entry.carb_target_g > Decimal::ZERO => Some(format!(
            " Intake was not logged, so the model used {}g (~60% of target) for repletion.",
            round_half_up(entry.carb_target_g * DEFAULT_INTAKE_RATIO)
        )),
        IntakeType::None => Some(
            " Intake was not logged and no estimate was possible, so repletion was set to 0g."
                .to_string(),
        ),
        IntakeType::Logged if entry.carbs_logged_g <= Decimal::ZERO => {
            Some(" Intake is logged at 0g carbs.".to_string())
        }
        _ => None,
    }
}

pub fn build_why(entry: &LedgerEntry, flags: InsightFlags) -> String {
    let mut why = WHY_RULES
        .iter()
        .find(|rule| (rule.applies)(entry, flags))
        .map(|rule| (rule.text)(entry))
        .unwrap_or_else(|| DEFAULT_WHY.to_string());

    if entry.fill_pct_end < FILL_ORANGE_MIN {
        why.push_str(
            " Very low stores often show up as cravings, restless sleep, and higher perceived effort.",
        );
    }
    why.push_str(trend_sentence(flags.debt_trend));
    if let Some(caveat) = intake_caveat(entry) {
        why.push_str(&caveat);
    }

    why
}

pub fn generate_day_insights(entry: &LedgerEntry, flags: InsightFlags) -> DayInsights {
    DayInsights {
        headline: build_headline(entry),
        action: build_action(entry, flags),
        why: build_why(entry, flags),
    }
}
