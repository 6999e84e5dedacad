//! Constants and threshold tables for the glycogen ledger
//!
//! Every tunable number the engine uses lives here. Banded classifications
//! (risk flag, intensity buckets, headline tiers, readiness segments) are
//! expressed as ordered tables that are evaluated top-down, so each table can
//! be tested and re-tuned on its own.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Glycogen store model
// ---------------------------------------------------------------------------

/// Baseline capacity per kg of body weight (~490 g for a 70 kg athlete)
pub const CAPACITY_PER_KG: Decimal = dec!(7.0);

/// Supercompensation ceiling as a multiple of capacity
pub const SUPERCOMP_MULTIPLIER: Decimal = dec!(1.20);

/// Fraction of capacity the store holds before the first ledger day
pub const INITIAL_FILL_RATIO: Decimal = dec!(1.0);

/// Fill percentages (store / capacity × 100) that bound each status band
pub const FILL_LOADED_MIN: u32 = 100;
pub const FILL_GREEN_MIN: u32 = 80;
pub const FILL_YELLOW_MIN: u32 = 60;
pub const FILL_ORANGE_MIN: u32 = 40;

/// Fill percentage is clamped to this ceiling before scoring readiness
pub const FILL_SCORING_MAX: u32 = 120;

// ---------------------------------------------------------------------------
// Legacy debt projection
// ---------------------------------------------------------------------------

/// Lower bound of the legacy debt view (negative = topped-up buffer)
pub const DEBT_MIN: Decimal = dec!(-150);

/// Upper bound of the legacy debt view
pub const DEBT_MAX: Decimal = dec!(900);

// ---------------------------------------------------------------------------
// Depletion
// ---------------------------------------------------------------------------

pub const TSS_DEPLETION_MULTIPLIER: Decimal = dec!(1.2);
pub const CALORIE_DEPLETION_MULTIPLIER: Decimal = dec!(0.20);
pub const CALORIE_CLAMP_LOW: Decimal = dec!(0.7);
pub const CALORIE_CLAMP_HIGH: Decimal = dec!(1.3);

// ---------------------------------------------------------------------------
// Repletion
// ---------------------------------------------------------------------------

/// Share of consumed carbohydrate that ends up in the store
pub const REPLETION_EFFICIENCY: Decimal = dec!(0.70);

/// Absolute daily repletion ceiling in grams
pub const REPLETION_CAP_PER_DAY: Decimal = dec!(500);

/// Share of the carb target assumed eaten when nothing was logged
pub const DEFAULT_INTAKE_RATIO: Decimal = dec!(0.60);

// ---------------------------------------------------------------------------
// Hard day
// ---------------------------------------------------------------------------

pub const HARD_DAY_TSS: Decimal = dec!(90);
pub const HARD_DAY_DEPLETION: Decimal = dec!(350);
pub const HARD_DAY_INTENSITY_FACTOR: Decimal = dec!(0.88);
pub const HARD_DAY_MIN_DURATION: Decimal = dec!(45);

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

pub const CARB_BASE_PER_KG: Decimal = dec!(3.0);
pub const CARB_TRAINING_MULTIPLIER: Decimal = dec!(0.8);
pub const CARB_PAYDOWN_MULTIPLIER: Decimal = dec!(0.25);
pub const CARB_PAYDOWN_CAP: Decimal = dec!(200);
pub const CARB_SURPLUS_REDUCTION: Decimal = dec!(0.50);
pub const CARB_SURPLUS_REDUCTION_CAP: Decimal = dec!(100);
pub const CARB_MIN_PER_KG: Decimal = dec!(2.0);
pub const CARB_MAX_PER_KG: Decimal = dec!(8.0);

pub const PROTEIN_DEFAULT_PER_KG: Decimal = dec!(1.8);
pub const PROTEIN_MIN_PER_KG: Decimal = dec!(1.6);
pub const PROTEIN_MAX_PER_KG: Decimal = dec!(2.2);

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub const ALIGNMENT_CARB_WEIGHT: Decimal = dec!(0.6);
pub const ALIGNMENT_PROTEIN_WEIGHT: Decimal = dec!(0.4);

/// Extra carbohydrate simulated by the what-if projection
pub const WHAT_IF_EXTRA_CARBS: Decimal = dec!(200);

// ---------------------------------------------------------------------------
// Trend and baseline detection
// ---------------------------------------------------------------------------

/// Slope (g/day) that must be exceeded before a debt trend is reported
pub const TREND_DEAD_BAND: Decimal = dec!(10);

/// Number of values in the trailing trend window (today plus two prior days)
pub const TREND_WINDOW: usize = 3;

pub const BASELINE_DAYS: usize = 3;
pub const BASELINE_TSS_THRESHOLD: Decimal = dec!(250);
pub const BASELINE_DEPLETION_THRESHOLD: Decimal = dec!(450);

// ---------------------------------------------------------------------------
// Subject defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_WEIGHT_KG: Decimal = dec!(70);
pub const DEFAULT_HR_MAX: Decimal = dec!(180);
pub const DEFAULT_CARB_FACTOR: Decimal = dec!(1.0);

/// One row of a threshold table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band<K, T> {
    pub lower: K,
    pub inclusive: bool,
    pub outcome: T,
}

impl<K, T> Band<K, T> {
    /// Matches values `>= lower`
    pub const fn at_least(lower: K, outcome: T) -> Self {
        Band {
            lower,
            inclusive: true,
            outcome,
        }
    }

    /// Matches values `> lower`
    pub const fn above(lower: K, outcome: T) -> Self {
        Band {
            lower,
            inclusive: false,
            outcome,
        }
    }
}

/// Ordered list of lower-bound bands, evaluated top-down
///
/// The first band whose lower bound the value clears wins; values below
/// every band get the fallback outcome.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable<K: 'static, T: 'static> {
    bands: &'static [Band<K, T>],
    fallback: T,
}

impl<K: PartialOrd + Copy, T: Copy> ThresholdTable<K, T> {
    pub const fn new(bands: &'static [Band<K, T>], fallback: T) -> Self {
        ThresholdTable { bands, fallback }
    }

    pub fn classify(&self, value: K) -> T {
        self.bands
            .iter()
            .find(|band| {
                if band.inclusive {
                    value >= band.lower
                } else {
                    value > band.lower
                }
            })
            .map(|band| band.outcome)
            .unwrap_or(self.fallback)
    }
}

/// Clamp a decimal into `[min, max]`
pub fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}

/// Round half up (`floor(x + 0.5)`), the rounding every gram figure uses
pub fn round_half_up(value: Decimal) -> Decimal {
    (value + dec!(0.5)).floor()
}

/// Round to the nearest multiple (used for coaching figures)
pub fn round_to_nearest(value: Decimal, multiple: Decimal) -> Decimal {
    if multiple <= Decimal::ZERO {
        return round_half_up(value);
    }
    round_half_up(value / multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low,
        Mid,
        High,
    }

    const LEVELS: ThresholdTable<u32, Level> = ThresholdTable::new(
        &[Band::above(10, Level::High), Band::at_least(5, Level::Mid)],
        Level::Low,
    );

    #[test]
    fn test_threshold_table_is_evaluated_top_down() {
        assert_eq!(LEVELS.classify(11), Level::High);
        assert_eq!(LEVELS.classify(10), Level::Mid);
        assert_eq!(LEVELS.classify(5), Level::Mid);
        assert_eq!(LEVELS.classify(4), Level::Low);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(dec!(309.4)), dec!(309));
        assert_eq!(round_half_up(dec!(2.5)), dec!(3));
        assert_eq!(round_half_up(dec!(-2.5)), dec!(-2));
        assert_eq!(round_half_up(dec!(-2.6)), dec!(-3));
    }

    #[test]
    fn test_round_to_nearest() {
        assert_eq!(round_to_nearest(dec!(137), dec!(25)), dec!(125));
        assert_eq!(round_to_nearest(dec!(138), dec!(25)), dec!(150));
        assert_eq!(round_to_nearest(dec!(224), dec!(50)), dec!(200));
        assert_eq!(round_to_nearest(dec!(225), dec!(50)), dec!(250));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(dec!(5), dec!(0), dec!(10)), dec!(5));
        assert_eq!(clamp(dec!(-5), dec!(0), dec!(10)), dec!(0));
        assert_eq!(clamp(dec!(15), dec!(0), dec!(10)), dec!(10));
    }
}
