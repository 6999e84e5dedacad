//! Ledger recompute orchestration
//!
//! Loads a subject's inputs through a [`LedgerRepository`], runs both ledger
//! passes and writes the results back:
//! - per-record depletion and intensity are derived in parallel
//! - the day fold runs strictly in date order, with cancellation and
//!   progress checked only between days
//! - nothing is written until every day has been computed

use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::baseline::{detect_ongoing_training_block, should_show_baseline_prompt, BaselineDetection};
use crate::config::LedgerSettings;
use crate::database::LedgerRepository;
use crate::depletion::process_records;
use crate::error::LedgerError;
use crate::ledger::{annotate_all, assemble_days, date_range, fold_days, LedgerContext, LedgerDay};
use crate::models::{ResolvedSettings, SubjectSettings};
use crate::scoring::{project_what_if, WhatIfProjection};

/// Progress milestones reported as `(current, PROGRESS_TOTAL, message)`
pub const PROGRESS_TOTAL: u32 = 100;
const PROGRESS_LEDGER_START: u32 = 40;
const PROGRESS_LEDGER_SPAN: u32 = 40;
const PROGRESS_TICK_DAYS: usize = 5;

/// Per-run options for [`LedgerEngine::recompute`]
#[derive(Default)]
pub struct RecomputeOptions<'a> {
    /// Window length; the configured default when `None`
    pub days: Option<u32>,
    /// Last day of the window; today when `None`
    pub end_date: Option<NaiveDate>,
    pub progress: Option<&'a dyn Fn(u32, u32, &str)>,
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Outcome of a successful recompute
#[derive(Debug, Clone)]
pub struct RecomputeSummary {
    pub subject: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_processed: usize,
    pub records_processed: usize,
    pub intake_days: usize,
    pub baseline: BaselineDetection,
    pub show_baseline_prompt: bool,
    pub duration_ms: u128,
    pub ledger: Vec<LedgerDay>,
}

impl RecomputeSummary {
    pub fn latest(&self) -> Option<&LedgerDay> {
        self.ledger.last()
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            "Ledger Recompute Summary\n  \
             Subject: {}\n  \
             Window: {} to {}\n  \
             Days: {}\n  \
             Training Records: {}\n  \
             Days With Intake: {}\n  \
             Total Time: {:.2}s",
            self.subject,
            self.start_date,
            self.end_date,
            self.days_processed,
            self.records_processed,
            self.intake_days,
            self.duration_ms as f64 / 1000.0,
        )
    }
}

/// Runs ledger recomputes against a repository
pub struct LedgerEngine<R: LedgerRepository> {
    repo: R,
    settings: LedgerSettings,
    subject_defaults: SubjectSettings,
}

impl<R: LedgerRepository> LedgerEngine<R> {
    pub fn new(repo: R) -> Self {
        Self::with_settings(repo, LedgerSettings::default())
    }

    pub fn with_settings(repo: R, settings: LedgerSettings) -> Self {
        Self {
            repo,
            settings,
            subject_defaults: SubjectSettings::default(),
        }
    }

    /// Settings used for subjects with nothing stored
    pub fn with_subject_defaults(mut self, defaults: SubjectSettings) -> Self {
        self.subject_defaults = defaults;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Inclusive `[end - days, end]` window
    pub fn window(
        &self,
        days: Option<u32>,
        end_date: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate), LedgerError> {
        let days = days.unwrap_or(self.settings.window_days);
        if days == 0 {
            return Err(LedgerError::InvalidWindow {
                reason: "window must cover at least one day".to_string(),
            });
        }

        let end = end_date.unwrap_or_else(|| Local::now().date_naive());
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| LedgerError::InvalidWindow {
                reason: format!("{} days before {} is out of range", days, end),
            })?;
        Ok((start, end))
    }

    /// Subject settings, falling back to defaults when the read fails
    pub fn resolve_settings(&self, subject: &str) -> ResolvedSettings {
        match self.repo.load_settings(subject) {
            Ok(Some(settings)) => settings.resolve(),
            Ok(None) => self.subject_defaults.resolve(),
            Err(err) => {
                warn!(subject, error = %err, "failed to load settings, using defaults");
                self.subject_defaults.resolve()
            }
        }
    }

    /// Recompute and persist the ledger for one subject
    pub fn recompute(
        &mut self,
        subject: &str,
        options: RecomputeOptions<'_>,
    ) -> Result<RecomputeSummary, LedgerError> {
        let started = Instant::now();
        let report = |current: u32, message: &str| {
            if let Some(progress) = options.progress {
                progress(current, PROGRESS_TOTAL, message);
            }
        };
        let cancelled = || {
            options
                .cancel
                .as_ref()
                .map(|flag| flag.load(Ordering::Relaxed))
                .unwrap_or(false)
        };

        let (start, end) = self.window(options.days, options.end_date)?;
        info!(subject, %start, %end, "Starting ledger recompute");

        report(0, "Fetching data...");
        let settings = self.resolve_settings(subject);
        let records = self
            .repo
            .load_training_records(subject, start, end)
            .map_err(|source| LedgerError::LoadFailed {
                what: "training records".to_string(),
                source,
            })?;
        let intakes = self
            .repo
            .load_intake_records(subject, start, end)
            .unwrap_or_else(|err| {
                warn!(subject, error = %err, "failed to load intake records, treating as none logged");
                Vec::new()
            });
        let intake_days = intakes.len();

        report(20, "Processing workouts...");
        let records = process_records(records, settings.hr_max);
        let records_processed = records.len();
        debug!(records = records_processed, "Derived depletion and intensity");

        report(PROGRESS_LEDGER_START, "Computing ledger...");
        let ctx = LedgerContext::new(settings.clone());
        let dates = date_range(start, end);
        let total_days = dates.len();
        let days = assemble_days(&dates, records.clone(), intakes);

        let entries = fold_days(&ctx, &days, |index, date| {
            if cancelled() {
                return Err(LedgerError::Cancelled { date });
            }
            if index % PROGRESS_TICK_DAYS == 0 {
                let done = index as u32 * PROGRESS_LEDGER_SPAN;
                let share = (done + total_days as u32 / 2) / total_days as u32;
                report(
                    PROGRESS_LEDGER_START + share,
                    &format!("Processing day {}/{}...", index + 1, total_days),
                );
            }
            debug!(%date, "ledger day");
            Ok(())
        })
        .map_err(|err| {
            if let LedgerError::Cancelled { date } = &err {
                info!(subject, %date, "Ledger recompute cancelled");
            }
            err
        })?;

        report(80, "Generating insights...");
        let ledger = annotate_all(&entries, self.settings.trend_dead_band_g);
        let baseline = detect_ongoing_training_block(&entries);
        let show_baseline_prompt = should_show_baseline_prompt(&settings, &baseline);

        report(90, "Saving to database...");
        for record in &records {
            self.repo
                .update_record_derivations(record)
                .map_err(|source| LedgerError::RecordUpdateFailed {
                    record_id: record.id.clone(),
                    source,
                })?;
        }
        for day in &ledger {
            self.repo
                .upsert_ledger_day(subject, day)
                .map_err(|source| LedgerError::UpsertFailed {
                    date: day.date(),
                    source,
                })?;
        }

        report(PROGRESS_TOTAL, "Complete!");

        let summary = RecomputeSummary {
            subject: subject.to_string(),
            start_date: start,
            end_date: end,
            days_processed: ledger.len(),
            records_processed,
            intake_days,
            baseline,
            show_baseline_prompt,
            duration_ms: started.elapsed().as_millis(),
            ledger,
        };
        info!("{}", summary.to_string_pretty());

        Ok(summary)
    }

    /// Stored ledger days for a subject
    pub fn ledger(
        &self,
        subject: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<LedgerDay>, LedgerError> {
        self.repo
            .load_ledger_days(subject, start, end)
            .map_err(|source| LedgerError::LoadFailed {
                what: "ledger days".to_string(),
                source,
            })
    }

    /// Stored day for `date`, or the latest stored day
    pub fn ledger_day(
        &self,
        subject: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<LedgerDay>, LedgerError> {
        Ok(self.ledger(subject, None, date)?.pop().filter(|day| match date {
            Some(date) => day.date() == date,
            None => true,
        }))
    }

    /// Effect of extra carbohydrate on the end-of-day store of a stored day
    pub fn what_if(
        &self,
        subject: &str,
        date: Option<NaiveDate>,
        extra_carbs_g: Option<Decimal>,
    ) -> Result<Option<(LedgerDay, WhatIfProjection)>, LedgerError> {
        Ok(self.ledger_day(subject, date)?.map(|day| {
            let projection =
                project_what_if(day.entry.store_end_g, day.entry.capacity_g, extra_carbs_g);
            (day, projection)
        }))
    }

    /// Baseline detection over the stored ledger plus the prompt decision
    pub fn baseline(&self, subject: &str) -> Result<(BaselineDetection, bool), LedgerError> {
        let days = self.ledger(subject, None, None)?;
        let detection = detect_ongoing_training_block(&days);
        let settings = self.resolve_settings(subject);
        let show = should_show_baseline_prompt(&settings, &detection);
        Ok((detection, show))
    }
}
