use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

use fuelrs::config::AppConfig;
use fuelrs::database::{LedgerRepository, SqliteRepository};
use fuelrs::engine::{LedgerEngine, RecomputeOptions};
use fuelrs::error::FuelError;
use fuelrs::export::{export_ledger, ExportFormat};
use fuelrs::ledger::LedgerDay;
use fuelrs::logging::{init_logging, log_error};
use fuelrs::models::{IntakeRecord, TrainingRecord};
use fuelrs::scoring::{AlignmentBadge, RiskFlag};

/// fuelrs - Glycogen Ledger CLI
///
/// Turns training sessions and nutrition logs into a day-by-day account of
/// glycogen store, carbohydrate targets and readiness.
#[derive(Parser)]
#[command(name = "fuelrs")]
#[command(author = "fuelrs Contributors")]
#[command(version)]
#[command(about = "Glycogen ledger and fueling guidance", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute and store the ledger for a window of days
    Recompute {
        #[arg(short, long)]
        subject: Option<String>,

        /// Days before the end date to include (config default if omitted)
        #[arg(short, long)]
        days: Option<u32>,

        /// Last day of the window (YYYY-MM-DD, default today)
        #[arg(short, long)]
        end: Option<NaiveDate>,
    },

    /// Display stored ledger days in a table
    Show {
        #[arg(short, long)]
        subject: Option<String>,

        /// Number of most recent days to show
        #[arg(short, long, default_value = "14")]
        limit: usize,
    },

    /// Show headline, action and explanation for a day
    Insights {
        #[arg(short, long)]
        subject: Option<String>,

        /// Day to explain (latest stored day if omitted)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Check whether history starts mid training block
    Baseline {
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Project the store after eating extra carbohydrate
    WhatIf {
        #[arg(short, long)]
        subject: Option<String>,

        /// Extra carbohydrate in grams (default 200)
        #[arg(short, long)]
        carbs: Option<Decimal>,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Load training and intake records from JSON arrays
    Load {
        #[arg(short, long)]
        subject: Option<String>,

        /// JSON array of training records
        #[arg(short, long)]
        training: Option<PathBuf>,

        /// JSON array of intake records
        #[arg(short, long)]
        intake: Option<PathBuf>,
    },

    /// View or update a subject's settings
    Settings {
        #[arg(short, long)]
        subject: Option<String>,

        /// Body weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Protein target in g per kg
        #[arg(long)]
        protein: Option<f64>,

        #[arg(long)]
        carb_factor: Option<f64>,

        #[arg(long)]
        max_hr: Option<f64>,

        /// Glycogen capacity override in grams
        #[arg(long)]
        capacity: Option<f64>,

        /// Debt already carried on the first ledger day, in grams
        #[arg(long)]
        starting_debt: Option<f64>,

        /// Stop offering the starting-debt prompt
        #[arg(long)]
        dismiss_baseline: bool,
    },

    /// Export stored ledger days
    Export {
        #[arg(short, long)]
        subject: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json); guessed from the extension if omitted
        #[arg(short = 'f', long)]
        format: Option<String>,
    },
}

#[derive(Tabled)]
struct LedgerRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Store (g)")]
    store: String,
    #[tabled(rename = "Fill %")]
    fill: u32,
    #[tabled(rename = "Depletion (g)")]
    depletion: String,
    #[tabled(rename = "Carb Target (g)")]
    carb_target: String,
    #[tabled(rename = "Carbs (g)")]
    carbs: String,
    #[tabled(rename = "Alignment")]
    alignment: String,
    #[tabled(rename = "Readiness")]
    readiness: u8,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

impl From<&LedgerDay> for LedgerRow {
    fn from(day: &LedgerDay) -> Self {
        let entry = &day.entry;
        let carbs = match entry.intake_type {
            fuelrs::intake::IntakeType::Logged => entry.carbs_logged_g.to_string(),
            fuelrs::intake::IntakeType::Estimated => format!("~{}", entry.carbs_logged_g),
            fuelrs::intake::IntakeType::None => "-".to_string(),
        };
        LedgerRow {
            date: entry.date.to_string(),
            store: entry.store_end_g.round().to_string(),
            fill: entry.fill_pct_end,
            depletion: entry.depletion_total_g.to_string(),
            carb_target: entry.carb_target_g.to_string(),
            carbs,
            alignment: entry
                .alignment_grade
                .map(|grade| format!("{} ({})", grade.overall, grade.badge))
                .unwrap_or_else(|| "-".to_string()),
            readiness: entry.readiness_score,
            risk: entry.risk_flag.to_string(),
            trend: day.debt_trend.to_string(),
        }
    }
}

fn colored_risk(flag: RiskFlag) -> ColoredString {
    let label = flag.to_string();
    match flag {
        RiskFlag::Green => label.green(),
        RiskFlag::Yellow => label.yellow(),
        RiskFlag::Orange => label.truecolor(255, 165, 0),
        RiskFlag::Red => label.red(),
    }
}

fn open_engine(config: &AppConfig) -> Result<LedgerEngine<SqliteRepository>> {
    let path = &config.storage.database_path;
    let repo = SqliteRepository::new(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    Ok(LedgerEngine::with_settings(repo, config.ledger.clone())
        .with_subject_defaults(config.defaults.clone()))
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON array in {}", path.display()))
}

fn report_failure(err: impl Into<FuelError>) -> anyhow::Error {
    let err = err.into();
    log_error(&err);
    anyhow::anyhow!(err.user_message())
}

fn colored_badge(badge: AlignmentBadge) -> ColoredString {
    let label = badge.to_string();
    match badge {
        AlignmentBadge::Green => label.green(),
        AlignmentBadge::Yellow => label.yellow(),
        AlignmentBadge::Orange => label.truecolor(255, 165, 0),
        AlignmentBadge::Red => label.red(),
    }
}

fn print_day(day: &LedgerDay) {
    let entry = &day.entry;
    println!(
        "{} {}  store {}g ({}%)  readiness {}  risk {}",
        "▶".cyan(),
        entry.date.to_string().bold(),
        entry.store_end_g.round(),
        entry.fill_pct_end,
        entry.readiness_score,
        colored_risk(entry.risk_flag),
    );
    if let Some(grade) = entry.alignment_grade {
        println!(
            "  {} {} {} ({}; carbs {}, protein {})",
            "Alignment:".cyan(),
            grade.overall,
            colored_badge(grade.badge),
            grade.description(),
            grade.carb_score,
            grade.protein_score
        );
    }
    println!("  {}", day.insights.headline.bold());
    println!("  {} {}", "Action:".cyan(), day.insights.action);
    println!("  {} {}", "Why:".cyan(), day.insights.why);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    init_logging(&config.logging.clone().with_verbose(cli.verbose > 0))?;

    let mut engine = open_engine(&config)?;

    match cli.command {
        Commands::Recompute { subject, days, end } => {
            let subject = config.subject_or_default(subject)?;
            println!("{}", "Recomputing glycogen ledger...".green().bold());

            let pb = if config.ledger.show_progress {
                let pb = ProgressBar::new(100);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
                        .progress_chars("#>-"),
                );
                pb
            } else {
                ProgressBar::hidden()
            };
            let callback = |current: u32, _total: u32, message: &str| {
                pb.set_position(u64::from(current));
                pb.set_message(message.to_string());
            };

            let result = engine.recompute(
                &subject,
                RecomputeOptions {
                    days,
                    end_date: end,
                    progress: Some(&callback as &dyn Fn(u32, u32, &str)),
                    cancel: None,
                },
            );
            pb.finish_and_clear();
            let summary = result.map_err(report_failure)?;

            println!("{}", summary.to_string_pretty());
            if let Some(day) = summary.latest() {
                print_day(day);
            }
            if summary.show_baseline_prompt {
                if let Some(reason) = &summary.baseline.reason {
                    println!("{} {}", "!".yellow().bold(), reason.yellow());
                    println!(
                        "  Set a starting debt with `fuelrs settings --subject {} --starting-debt <grams>`",
                        subject
                    );
                }
            }
            println!("{}", "✓ Ledger updated".green());
        }

        Commands::Show { subject, limit } => {
            let subject = config.subject_or_default(subject)?;
            let days = engine.ledger(&subject, None, None).map_err(report_failure)?;
            if days.is_empty() {
                println!("{}", "No ledger days stored; run `fuelrs recompute` first".dimmed());
                return Ok(());
            }

            let skip = days.len().saturating_sub(limit);
            let rows: Vec<LedgerRow> = days[skip..].iter().map(LedgerRow::from).collect();
            println!("{}", Table::new(rows));
            if let Some(latest) = days.last() {
                println!("Today: {}", colored_risk(latest.entry.risk_flag));
            }
        }

        Commands::Insights { subject, date } => {
            let subject = config.subject_or_default(subject)?;
            match engine.ledger_day(&subject, date).map_err(report_failure)? {
                Some(day) => print_day(&day),
                None => println!("{}", "No ledger day stored for that date".dimmed()),
            }
        }

        Commands::Baseline { subject } => {
            let subject = config.subject_or_default(subject)?;
            let (detection, show) = engine.baseline(&subject).map_err(report_failure)?;
            println!("{}", "Baseline check".cyan().bold());
            println!("  TSS in first 3 days: {}", detection.tss_first_days);
            println!("  Max single-day depletion: {}g", detection.max_depletion_g);
            match &detection.reason {
                Some(reason) => println!("  {}", reason.yellow()),
                None => println!("  {}", "History starts from a normal load".green()),
            }
            if show {
                println!("  Consider setting a starting debt for this subject.");
            }
        }

        Commands::WhatIf { subject, carbs, date } => {
            let subject = config.subject_or_default(subject)?;
            match engine.what_if(&subject, date, carbs).map_err(report_failure)? {
                Some((day, projection)) => {
                    println!(
                        "{} {}: +{}g carbs",
                        "What if".cyan().bold(),
                        day.date(),
                        projection.extra_carbs_g
                    );
                    println!(
                        "  Store {}g -> {}g",
                        day.entry.store_end_g.round(),
                        projection.store_after_g
                    );
                    println!(
                        "  Fill {}% -> {}%",
                        day.entry.fill_pct_end, projection.fill_pct_after
                    );
                    println!(
                        "  Readiness {} -> {}",
                        day.entry.readiness_score, projection.readiness_after
                    );
                    if projection.surplus_after_g > Decimal::ZERO {
                        println!("  Surplus above capacity: {}g", projection.surplus_after_g);
                    }
                }
                None => println!("{}", "No ledger day stored for that date".dimmed()),
            }
        }

        Commands::Load {
            subject,
            training,
            intake,
        } => {
            let subject = config.subject_or_default(subject)?;
            let repo = engine.repository_mut();

            if let Some(path) = training {
                let records: Vec<TrainingRecord> = read_json_array(&path)?;
                for record in &records {
                    repo.store_training_record(&subject, record)
                        .map_err(report_failure)?;
                }
                println!("{} Loaded {} training records", "✓".green(), records.len());
            }
            if let Some(path) = intake {
                let records: Vec<IntakeRecord> = read_json_array(&path)?;
                for record in &records {
                    repo.store_intake_record(&subject, record)
                        .map_err(report_failure)?;
                }
                println!("{} Loaded {} intake days", "✓".green(), records.len());
            }
        }

        Commands::Settings {
            subject,
            weight,
            protein,
            carb_factor,
            max_hr,
            capacity,
            starting_debt,
            dismiss_baseline,
        } => {
            let subject = config.subject_or_default(subject)?;
            let stored = engine
                .repository()
                .load_settings(&subject)
                .map_err(report_failure)?;
            let mut settings = config.settings_for(stored);

            let changed = weight.is_some()
                || protein.is_some()
                || carb_factor.is_some()
                || max_hr.is_some()
                || capacity.is_some()
                || starting_debt.is_some()
                || dismiss_baseline;

            if changed {
                settings.weight_kg = weight.or(settings.weight_kg);
                settings.protein_g_per_kg = protein.or(settings.protein_g_per_kg);
                settings.carb_factor = carb_factor.or(settings.carb_factor);
                settings.hr_max = max_hr.or(settings.hr_max);
                settings.glycogen_capacity_g = capacity.or(settings.glycogen_capacity_g);
                settings.starting_debt_g = starting_debt.or(settings.starting_debt_g);
                settings.baseline_prompt_dismissed |= dismiss_baseline;

                engine
                    .repository_mut()
                    .save_settings(&subject, &settings)
                    .map_err(report_failure)?;
                println!("{} Settings saved for {}", "✓".green(), subject);
            }

            let resolved = settings.resolve();
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }

        Commands::Export {
            subject,
            output,
            format,
        } => {
            let subject = config.subject_or_default(subject)?;
            let format = match format {
                Some(name) => name.parse::<ExportFormat>()?,
                None => ExportFormat::from_path(&output).unwrap_or(ExportFormat::Csv),
            };

            let days = engine.ledger(&subject, None, None).map_err(report_failure)?;
            export_ledger(&days, &output, format).map_err(report_failure)?;
            println!(
                "{} Exported {} days to {}",
                "✓".green(),
                days.len(),
                output.display()
            );
        }
    }

    Ok(())
}
