//! Unified error hierarchy for fuelrs
//!
//! Missing data is never an error in the ledger; these types cover the hard
//! failures around it: storage, window validation, cancellation and
//! configuration.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all fuelrs operations
#[derive(Debug, Error)]
pub enum FuelError {
    /// Storage errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Ledger run errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Record not found
    #[error("Record not found: {table}.{id}")]
    NotFound { table: String, id: String },

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// A write was rejected
    #[error("Failed to write {what}: {reason}")]
    WriteFailed { what: String, reason: String },
}

/// Errors surfaced by a ledger run
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },

    /// Input set could not be read
    #[error("Failed to load {what}: {source}")]
    LoadFailed {
        what: String,
        #[source]
        source: PersistenceError,
    },

    /// Writing derived fields back onto a training record failed
    #[error("Failed to update training record {record_id}: {source}")]
    RecordUpdateFailed {
        record_id: String,
        #[source]
        source: PersistenceError,
    },

    /// Persisting a ledger day failed
    #[error("Failed to save ledger day {date}: {source}")]
    UpsertFailed {
        date: NaiveDate,
        #[source]
        source: PersistenceError,
    },

    /// Run was cancelled before the given day started
    #[error("Ledger run cancelled before {date}")]
    Cancelled { date: NaiveDate },
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

/// Result type alias for fuelrs operations
pub type Result<T> = std::result::Result<T, FuelError>;

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization {
            reason: err.to_string(),
        }
    }
}

impl PersistenceError {
    fn is_busy(&self) -> bool {
        matches!(
            self,
            PersistenceError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
        )
    }
}

impl FuelError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FuelError::Io(_) => true,
            FuelError::Persistence(e) => e.is_busy(),
            FuelError::Ledger(LedgerError::LoadFailed { source, .. })
            | FuelError::Ledger(LedgerError::RecordUpdateFailed { source, .. })
            | FuelError::Ledger(LedgerError::UpsertFailed { source, .. }) => source.is_busy(),
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FuelError::Persistence(PersistenceError::NotFound { .. }) => ErrorSeverity::Warning,
            FuelError::Configuration(_) => ErrorSeverity::Warning,
            FuelError::Ledger(LedgerError::Cancelled { .. }) => ErrorSeverity::Info,
            FuelError::Ledger(LedgerError::InvalidWindow { .. }) => ErrorSeverity::Warning,
            FuelError::Persistence(PersistenceError::Serialization { .. }) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FuelError::Ledger(LedgerError::UpsertFailed { date, .. }) => {
                format!(
                    "Could not save the ledger for {}. Days before it were saved; re-running is safe.",
                    date
                )
            }
            FuelError::Ledger(LedgerError::Cancelled { date }) => {
                format!("Recompute cancelled before {}. Nothing was saved.", date)
            }
            FuelError::Ledger(LedgerError::LoadFailed { what, .. }) => {
                format!("Unable to read {}. Please check your database path.", what)
            }
            FuelError::Persistence(PersistenceError::NotFound { table, id }) => {
                format!("No {} found for '{}'", table, id)
            }
            _ => self.to_string(),
        }
    }
}

impl LedgerError {
    /// Date attached to the failure, if the error is tied to a ledger day
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            LedgerError::UpsertFailed { date, .. } | LedgerError::Cancelled { date } => {
                Some(*date)
            }
            _ => None,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_error_severity() {
        let err = FuelError::Configuration("missing subject".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = FuelError::Ledger(LedgerError::Cancelled { date: date() });
        assert_eq!(err.severity(), ErrorSeverity::Info);

        let err = FuelError::Ledger(LedgerError::UpsertFailed {
            date: date(),
            source: PersistenceError::WriteFailed {
                what: "ledger_days".to_string(),
                reason: "disk full".to_string(),
            },
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_upsert_failure_reports_date() {
        let err = LedgerError::UpsertFailed {
            date: date(),
            source: PersistenceError::WriteFailed {
                what: "ledger_days".to_string(),
                reason: "disk full".to_string(),
            },
        };
        assert_eq!(err.date(), Some(date()));
        assert!(err.to_string().contains("2024-03-05"));

        let fuel: FuelError = err.into();
        assert!(fuel.user_message().contains("2024-03-05"));
        assert!(!fuel.is_retryable());
    }

    #[test]
    fn test_retryable_errors() {
        let err = FuelError::Io(std::io::Error::new(std::io::ErrorKind::Other, "test"));
        assert!(err.is_retryable());

        let err = FuelError::Configuration("bad".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: PersistenceError = parse.unwrap_err().into();
        assert!(matches!(err, PersistenceError::Serialization { .. }));
    }
}
