// Library interface for fuelrs modules
// The CLI, integration tests and benches all go through these exports

pub mod baseline;
pub mod config;
pub mod database;
pub mod depletion;
pub mod engine;
pub mod error;
pub mod export;
pub mod insights;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod scoring;
pub mod targets;
pub mod thresholds;
pub mod trend;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::{detect_ongoing_training_block, should_show_baseline_prompt, BaselineDetection};
pub use database::{LedgerRepository, MemoryRepository, SqliteRepository};
pub use engine::{LedgerEngine, RecomputeOptions, RecomputeSummary};
pub use error::{FuelError, LedgerError, PersistenceError, Result};
pub use export::{export_ledger, ExportFormat};
pub use insights::DayInsights;
pub use ledger::{build_ledger, DayInput, LedgerContext, LedgerDay, LedgerEntry};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use scoring::{RiskFlag, WhatIfProjection};
pub use trend::DebtTrend;
