//! Short-window debt trend classification

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::thresholds::TREND_DEAD_BAND;

/// Direction of legacy debt over the trailing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl DebtTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtTrend::Increasing => "increasing",
            DebtTrend::Decreasing => "decreasing",
            DebtTrend::Stable => "stable",
        }
    }
}

impl fmt::Display for DebtTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the average daily change across `values` (oldest first)
///
/// The slope is `(last - first) / (n - 1)`; anything within `dead_band`
/// grams per day of zero is stable.
pub fn classify_debt_trend(values: &[Decimal], dead_band: Decimal) -> DebtTrend {
    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => (*first, *last),
        _ => return DebtTrend::Stable,
    };

    let slope = (last - first) / Decimal::from(values.len() - 1);
    if slope > dead_band {
        DebtTrend::Increasing
    } else if slope < -dead_band {
        DebtTrend::Decreasing
    } else {
        DebtTrend::Stable
    }
}

/// [`classify_debt_trend`] with the default dead band
pub fn calculate_debt_trend(values: &[Decimal]) -> DebtTrend {
    classify_debt_trend(values, TREND_DEAD_BAND)
}
