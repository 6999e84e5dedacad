use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::thresholds::{
    DEFAULT_CARB_FACTOR, DEFAULT_HR_MAX, DEFAULT_WEIGHT_KG, PROTEIN_DEFAULT_PER_KG,
};

/// Sport tag carried by a training record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Run,
    Bike,
    Swim,
    Strength,
    Rest,
    Other,
}

impl Sport {
    /// Map a free-form activity label onto a sport tag
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "run" | "running" | "jogging" => Sport::Run,
            "bike" | "cycling" | "biking" | "ride" => Sport::Bike,
            "swim" | "swimming" => Sport::Swim,
            "strength" | "strength training" | "weights" | "gym" => Sport::Strength,
            "rest" | "recovery" => Sport::Rest,
            _ => Sport::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Run => "run",
            Sport::Bike => "bike",
            Sport::Swim => "swim",
            Sport::Strength => "strength",
            Sport::Rest => "rest",
            Sport::Other => "other",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Sport::normalize(s))
    }
}

/// How a record's depletion estimate was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepletionMethod {
    /// Training-stress estimate clamped into a band around the calorie estimate
    TssClampedByCal,
    /// Training-stress estimate only (no calories recorded)
    TssOnly,
}

impl DepletionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepletionMethod::TssClampedByCal => "tss_clamped_by_cal",
            DepletionMethod::TssOnly => "tss_only",
        }
    }
}

impl FromStr for DepletionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tss_clamped_by_cal" => Ok(DepletionMethod::TssClampedByCal),
            "tss_only" => Ok(DepletionMethod::TssOnly),
            _ => Err(format!("Invalid depletion method: {}", s)),
        }
    }
}

/// Intensity bucket of a single training record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBucket {
    Easy,
    Moderate,
    Hard,
    Unknown,
}

impl IntensityBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityBucket::Easy => "easy",
            IntensityBucket::Moderate => "moderate",
            IntensityBucket::Hard => "hard",
            IntensityBucket::Unknown => "unknown",
        }
    }
}

impl FromStr for IntensityBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(IntensityBucket::Easy),
            "moderate" => Ok(IntensityBucket::Moderate),
            "hard" => Ok(IntensityBucket::Hard),
            "unknown" => Ok(IntensityBucket::Unknown),
            _ => Err(format!("Invalid intensity bucket: {}", s)),
        }
    }
}

/// Signal the intensity bucket was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensitySource {
    /// Intensity factor
    If,
    /// Average heart rate relative to max heart rate
    Hr,
    Unknown,
}

impl IntensitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensitySource::If => "if",
            IntensitySource::Hr => "hr",
            IntensitySource::Unknown => "unknown",
        }
    }
}

impl FromStr for IntensitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "if" => Ok(IntensitySource::If),
            "hr" => Ok(IntensitySource::Hr),
            "unknown" => Ok(IntensitySource::Unknown),
            _ => Err(format!("Invalid intensity source: {}", s)),
        }
    }
}

/// Fields the engine derives for a training record and writes back onto it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDerivation {
    /// Estimated glycogen depletion in grams (rounded)
    pub depletion_g: Decimal,
    pub depletion_method: DepletionMethod,
    pub intensity_bucket: IntensityBucket,
    pub intensity_source: IntensitySource,
}

/// One training session as delivered by the import pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Unique identifier for the record
    #[serde(default = "new_record_id")]
    pub id: String,

    /// Calendar date the session belongs to
    pub date: NaiveDate,

    #[serde(default = "default_sport")]
    pub sport: Sport,

    #[serde(default)]
    pub name: Option<String>,

    /// Duration in minutes
    #[serde(default)]
    pub duration_min: Option<Decimal>,

    #[serde(default)]
    pub distance_km: Option<Decimal>,

    /// Training Stress Score
    #[serde(default)]
    pub tss: Option<Decimal>,

    /// Intensity Factor
    #[serde(default)]
    pub intensity_factor: Option<Decimal>,

    #[serde(default)]
    pub avg_hr: Option<u16>,

    #[serde(default)]
    pub avg_power: Option<u16>,

    #[serde(default)]
    pub calories: Option<u32>,

    /// Depletion/intensity fields, present once the engine has processed the record
    #[serde(default)]
    pub derived: Option<RecordDerivation>,
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_sport() -> Sport {
    Sport::Other
}

impl TrainingRecord {
    /// Create a record with only a date and sport; all signals absent
    pub fn new(date: NaiveDate, sport: Sport) -> Self {
        TrainingRecord {
            id: new_record_id(),
            date,
            sport,
            name: None,
            duration_min: None,
            distance_km: None,
            tss: None,
            intensity_factor: None,
            avg_hr: None,
            avg_power: None,
            calories: None,
            derived: None,
        }
    }

    /// Depletion written back by the engine, zero if the record is unprocessed
    pub fn depletion_g(&self) -> Decimal {
        self.derived
            .as_ref()
            .map(|d| d.depletion_g)
            .unwrap_or(Decimal::ZERO)
    }
}

/// One day's logged nutrition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub date: NaiveDate,

    #[serde(default)]
    pub carbs_g: Option<Decimal>,

    #[serde(default)]
    pub protein_g: Option<Decimal>,
}

/// Per-subject constants as stored by the settings collaborator
///
/// Values are raw and may be missing, non-finite or out of range; call
/// [`SubjectSettings::resolve`] to get the sanitized form the engine uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectSettings {
    #[serde(default)]
    pub weight_kg: Option<f64>,

    #[serde(default)]
    pub protein_g_per_kg: Option<f64>,

    /// Carbohydrate scaling factor kept for the nutrition-targets view
    #[serde(default)]
    pub carb_factor: Option<f64>,

    #[serde(default)]
    pub hr_max: Option<f64>,

    /// Optional store capacity override in grams
    #[serde(default)]
    pub glycogen_capacity_g: Option<f64>,

    /// Legacy starting debt (grams below capacity on day zero)
    #[serde(default)]
    pub starting_debt_g: Option<f64>,

    #[serde(default)]
    pub baseline_prompt_dismissed: bool,
}

/// Sanitized subject settings in engine units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSettings {
    pub weight_kg: Decimal,
    pub protein_g_per_kg: Decimal,
    pub carb_factor: Decimal,
    pub hr_max: Decimal,
    pub capacity_override_g: Option<Decimal>,
    pub starting_debt_g: Option<Decimal>,
    pub baseline_prompt_dismissed: bool,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        SubjectSettings::default().resolve()
    }
}

fn positive_decimal(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .and_then(Decimal::from_f64)
}

impl SubjectSettings {
    /// Replace invalid or non-finite values with the documented defaults
    pub fn resolve(&self) -> ResolvedSettings {
        let starting_debt_g = self
            .starting_debt_g
            .filter(|v| v.is_finite() && *v >= 0.0)
            .and_then(Decimal::from_f64);

        ResolvedSettings {
            weight_kg: positive_decimal(self.weight_kg).unwrap_or(DEFAULT_WEIGHT_KG),
            protein_g_per_kg: positive_decimal(self.protein_g_per_kg)
                .unwrap_or(PROTEIN_DEFAULT_PER_KG),
            carb_factor: positive_decimal(self.carb_factor).unwrap_or(DEFAULT_CARB_FACTOR),
            hr_max: positive_decimal(self.hr_max).unwrap_or(DEFAULT_HR_MAX),
            capacity_override_g: positive_decimal(self.glycogen_capacity_g),
            starting_debt_g,
            baseline_prompt_dismissed: self.baseline_prompt_dismissed,
        }
    }
}
