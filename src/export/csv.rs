use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::export_failed;
use crate::error::ExportError;
use crate::ledger::LedgerDay;

/// One flat CSV row per ledger day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerCsvRow {
    pub date: String,
    pub capacity_g: Decimal,
    pub store_start_g: Decimal,
    pub store_end_g: Decimal,
    pub fill_pct_end: u32,
    pub deficit_end_g: Decimal,
    pub surplus_end_g: Decimal,
    pub debt_end_g: Decimal,
    pub depletion_total_g: Decimal,
    pub total_tss: Decimal,
    pub total_duration_min: Decimal,
    pub workout_count: u16,
    pub is_rest_day: bool,
    pub carb_target_g: Decimal,
    pub protein_target_g: Decimal,
    pub intake_type: String,
    pub carbs_logged_g: Decimal,
    pub protein_logged_g: Decimal,
    pub repletion_g: Decimal,
    pub is_hard_day: bool,
    pub alignment_score: Option<u8>,
    pub alignment_badge: Option<String>,
    pub readiness_score: u8,
    pub risk_flag: String,
    pub debt_trend: String,
    pub is_hard_tomorrow: bool,
    pub is_back_to_back: bool,
    pub insight_headline: String,
    pub insight_action: String,
    pub insight_why: String,
}

impl From<&LedgerDay> for LedgerCsvRow {
    fn from(day: &LedgerDay) -> Self {
        let entry = &day.entry;
        LedgerCsvRow {
            date: entry.date.format("%Y-%m-%d").to_string(),
            capacity_g: entry.capacity_g,
            store_start_g: entry.store_start_g,
            store_end_g: entry.store_end_g,
            fill_pct_end: entry.fill_pct_end,
            deficit_end_g: entry.deficit_end_g,
            surplus_end_g: entry.surplus_end_g,
            debt_end_g: entry.debt_end_g,
            depletion_total_g: entry.depletion_total_g,
            total_tss: entry.total_tss,
            total_duration_min: entry.total_duration_min,
            workout_count: entry.workout_count,
            is_rest_day: entry.is_rest_day,
            carb_target_g: entry.carb_target_g,
            protein_target_g: entry.protein_target_g,
            intake_type: entry.intake_type.to_string(),
            carbs_logged_g: entry.carbs_logged_g,
            protein_logged_g: entry.protein_logged_g,
            repletion_g: entry.repletion_g,
            is_hard_day: entry.is_hard_day,
            alignment_score: entry.alignment_score,
            alignment_badge: entry.alignment_grade.map(|grade| grade.badge.to_string()),
            readiness_score: entry.readiness_score,
            risk_flag: entry.risk_flag.to_string(),
            debt_trend: day.debt_trend.to_string(),
            is_hard_tomorrow: day.is_hard_tomorrow,
            is_back_to_back: day.is_back_to_back,
            insight_headline: day.insights.headline.clone(),
            insight_action: day.insights.action.clone(),
            insight_why: day.insights.why.clone(),
        }
    }
}

/// Write ledger rows with a header to any writer
pub fn write_ledger_csv<W: Write>(days: &[LedgerDay], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for day in days {
        wtr.serialize(LedgerCsvRow::from(day))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_ledger_csv(days: &[LedgerDay], path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|e| export_failed(path, e))?;
    write_ledger_csv(days, file).map_err(|e| export_failed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{build_ledger, DayInput, LedgerContext};
    use crate::models::{IntakeRecord, ResolvedSettings};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_days() -> Vec<LedgerDay> {
        let ctx = LedgerContext::new(ResolvedSettings::default());
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let intake = IntakeRecord {
            date: d2,
            carbs_g: Some(dec!(300)),
            protein_g: Some(dec!(120)),
        };
        build_ledger(
            &ctx,
            &[
                DayInput::rest(d1),
                DayInput {
                    date: d2,
                    records: Vec::new(),
                    intake: Some(intake),
                },
            ],
        )
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_day() {
        let mut buffer = Vec::new();
        write_ledger_csv(&sample_days(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("date,capacity_g,store_start_g"));
        assert!(lines[0].contains("insight_why"));
        assert!(lines[1].starts_with("2024-03-01,490,"));
        assert!(lines[2].contains(",logged,300,120,"));
        // estimated day has no badge, logged day does
        assert!(lines[0].contains(",alignment_score,alignment_badge,"));
        assert!(lines[1].contains(",,,"));
        assert!(lines[2].contains(",green,"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        export_ledger_csv(&sample_days(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("ledger.csv");
        let err = export_ledger_csv(&sample_days(), &path).unwrap_err();
        assert!(matches!(err, ExportError::ExportFailed { .. }));
    }
}
