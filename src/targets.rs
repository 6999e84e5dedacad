//! Store capacity, store metrics and daily intake targets

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ResolvedSettings;
use crate::thresholds::{
    clamp, round_half_up, CAPACITY_PER_KG, CARB_BASE_PER_KG, CARB_MAX_PER_KG, CARB_MIN_PER_KG,
    CARB_PAYDOWN_CAP, CARB_PAYDOWN_MULTIPLIER, CARB_SURPLUS_REDUCTION,
    CARB_SURPLUS_REDUCTION_CAP, CARB_TRAINING_MULTIPLIER, DEBT_MAX, DEBT_MIN,
    INITIAL_FILL_RATIO, PROTEIN_MAX_PER_KG, PROTEIN_MIN_PER_KG, SUPERCOMP_MULTIPLIER,
};

/// Run-wide store constants, derived once from the subject's settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreBounds {
    /// 100%-fill store level in grams
    pub capacity_g: Decimal,
    /// Hard ceiling the store may never exceed
    pub supercomp_cap_g: Decimal,
}

impl StoreBounds {
    pub fn from_settings(settings: &ResolvedSettings) -> Self {
        let capacity_g = calculate_capacity(settings.weight_kg, settings.capacity_override_g);
        StoreBounds {
            capacity_g,
            supercomp_cap_g: calculate_supercomp_cap(capacity_g),
        }
    }

    /// Store level before the first ledger day
    pub fn initial_store(&self, starting_debt_g: Option<Decimal>) -> Decimal {
        match starting_debt_g {
            Some(debt) => clamp(self.capacity_g - debt, Decimal::ZERO, self.supercomp_cap_g),
            None => self.capacity_g * INITIAL_FILL_RATIO,
        }
    }
}

/// Baseline capacity in grams (override wins when positive)
pub fn calculate_capacity(weight_kg: Decimal, capacity_override_g: Option<Decimal>) -> Decimal {
    match capacity_override_g.filter(|c| *c > Decimal::ZERO) {
        Some(capacity) => capacity,
        None => round_half_up(weight_kg * CAPACITY_PER_KG),
    }
}

pub fn calculate_supercomp_cap(capacity_g: Decimal) -> Decimal {
    round_half_up(capacity_g * SUPERCOMP_MULTIPLIER)
}

/// Deficit, surplus and fill percentage for a store level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreMetrics {
    pub deficit_g: Decimal,
    pub surplus_g: Decimal,
    pub fill_pct: u32,
}

pub fn derive_store_metrics(store_g: Decimal, capacity_g: Decimal) -> StoreMetrics {
    let fill_pct = if capacity_g > Decimal::ZERO {
        round_half_up(store_g / capacity_g * Decimal::ONE_HUNDRED)
            .to_u32()
            .unwrap_or(0)
    } else {
        0
    };

    StoreMetrics {
        deficit_g: (capacity_g - store_g).max(Decimal::ZERO),
        surplus_g: (store_g - capacity_g).max(Decimal::ZERO),
        fill_pct,
    }
}

/// Legacy debt view of a store level, bounded to `[-150, 900]`
pub fn legacy_debt(capacity_g: Decimal, store_g: Decimal) -> Decimal {
    clamp(capacity_g - store_g, DEBT_MIN, DEBT_MAX)
}

/// Inputs to the daily carbohydrate target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbTargetInput {
    pub weight_kg: Decimal,
    pub depletion_total_g: Decimal,
    pub deficit_g: Decimal,
    pub surplus_g: Decimal,
}

/// Breakdown of a carbohydrate target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbTarget {
    pub base: Decimal,
    pub training_add: Decimal,
    pub paydown_add: Decimal,
    pub surplus_reduce: Decimal,
    /// Final target in grams, rounded and clamped to `[2, 8] g/kg`
    pub target_g: Decimal,
}

pub fn calculate_carb_target(input: CarbTargetInput) -> CarbTarget {
    let base = input.weight_kg * CARB_BASE_PER_KG;
    let training_add = input.depletion_total_g * CARB_TRAINING_MULTIPLIER;
    let paydown_add = (input.deficit_g * CARB_PAYDOWN_MULTIPLIER).min(CARB_PAYDOWN_CAP);
    let surplus_reduce =
        (input.surplus_g * CARB_SURPLUS_REDUCTION).min(CARB_SURPLUS_REDUCTION_CAP);

    let raw = base + training_add + paydown_add - surplus_reduce;
    let target_g = round_half_up(clamp(
        raw,
        input.weight_kg * CARB_MIN_PER_KG,
        input.weight_kg * CARB_MAX_PER_KG,
    ));

    CarbTarget {
        base,
        training_add,
        paydown_add,
        surplus_reduce,
        target_g,
    }
}

/// Protein target in grams, preference clamped to `[1.6, 2.2] g/kg`
pub fn calculate_protein_target(weight_kg: Decimal, protein_g_per_kg: Decimal) -> Decimal {
    round_half_up(clamp(
        weight_kg * protein_g_per_kg,
        weight_kg * PROTEIN_MIN_PER_KG,
        weight_kg * PROTEIN_MAX_PER_KG,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn target(weight: Decimal, depletion: Decimal, deficit: Decimal, surplus: Decimal) -> Decimal {
        calculate_carb_target(CarbTargetInput {
            weight_kg: weight,
            depletion_total_g: depletion,
            deficit_g: deficit,
            surplus_g: surplus,
        })
        .target_g
    }

    #[test]
    fn test_carb_target_moderate_day() {
        // base 255 + training 54.4 + paydown 0 = 309.4
        let t = calculate_carb_target(CarbTargetInput {
            weight_kg: dec!(85),
            depletion_total_g: dec!(68),
            deficit_g: Decimal::ZERO,
            surplus_g: Decimal::ZERO,
        });
        assert_eq!(t.base, dec!(255));
        assert_eq!(t.training_add, dec!(54.4));
        assert_eq!(t.target_g, dec!(309));
    }

    #[test]
    fn test_carb_target_clamped_to_max() {
        // 255 + 480 + 200 = 935 -> 680
        assert_eq!(target(dec!(85), dec!(600), dec!(900), Decimal::ZERO), dec!(680));
    }

    #[test]
    fn test_carb_target_rest_days() {
        assert_eq!(target(dec!(60), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), dec!(180));
        assert_eq!(target(dec!(50), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), dec!(150));
    }

    #[test]
    fn test_carb_target_paydown_cap() {
        // 210 + 80 + min(250, 200) = 490
        assert_eq!(target(dec!(70), dec!(100), dec!(1000), Decimal::ZERO), dec!(490));
    }

    #[test]
    fn test_carb_target_surplus_reduction() {
        // 210 - min(40 * 0.5, 100) = 190
        assert_eq!(target(dec!(70), Decimal::ZERO, Decimal::ZERO, dec!(40)), dec!(190));
        // Reduction caps at 100 g and the result floors at 2 g/kg (140)
        assert_eq!(target(dec!(70), Decimal::ZERO, Decimal::ZERO, dec!(500)), dec!(140));
    }

    #[test]
    fn test_protein_target_bounds() {
        assert_eq!(calculate_protein_target(dec!(70), dec!(1.8)), dec!(126));
        assert_eq!(calculate_protein_target(dec!(70), dec!(1.0)), dec!(112));
        assert_eq!(calculate_protein_target(dec!(70), dec!(3.0)), dec!(154));
    }

    #[test]
    fn test_capacity_and_cap() {
        assert_eq!(calculate_capacity(dec!(70), None), dec!(490));
        assert_eq!(calculate_capacity(dec!(70), Some(dec!(600))), dec!(600));
        assert_eq!(calculate_capacity(dec!(70), Some(Decimal::ZERO)), dec!(490));
        assert_eq!(calculate_supercomp_cap(dec!(490)), dec!(588));
    }

    #[test]
    fn test_initial_store() {
        let bounds = StoreBounds {
            capacity_g: dec!(490),
            supercomp_cap_g: dec!(588),
        };
        assert_eq!(bounds.initial_store(None), dec!(490));
        assert_eq!(bounds.initial_store(Some(dec!(150))), dec!(340));
        assert_eq!(bounds.initial_store(Some(dec!(2000))), Decimal::ZERO);
    }

    #[test]
    fn test_store_metrics() {
        let below = derive_store_metrics(dec!(392), dec!(490));
        assert_eq!(below.deficit_g, dec!(98));
        assert_eq!(below.surplus_g, Decimal::ZERO);
        assert_eq!(below.fill_pct, 80);

        let above = derive_store_metrics(dec!(560), dec!(490));
        assert_eq!(above.deficit_g, Decimal::ZERO);
        assert_eq!(above.surplus_g, dec!(70));
        assert_eq!(above.fill_pct, 114);

        assert_eq!(derive_store_metrics(dec!(100), Decimal::ZERO).fill_pct, 0);
    }

    #[test]
    fn test_legacy_debt_bounds() {
        assert_eq!(legacy_debt(dec!(490), dec!(560)), dec!(-70));
        assert_eq!(legacy_debt(dec!(1000), dec!(1200)), dec!(-150));
        assert_eq!(legacy_debt(dec!(490), dec!(-1000)), dec!(900));
    }
}
