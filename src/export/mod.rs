//! Ledger export to CSV and JSON files

pub mod csv;
pub mod json;

use std::path::Path;

use crate::error::ExportError;
use crate::ledger::LedgerDay;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Write ledger days to `path` in the requested format
pub fn export_ledger<P: AsRef<Path>>(
    days: &[LedgerDay],
    path: P,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    tracing::info!(
        path = %path.display(),
        format = format.extension(),
        days = days.len(),
        "exporting ledger"
    );

    match format {
        ExportFormat::Csv => csv::export_ledger_csv(days, path),
        ExportFormat::Json => json::export_ledger_json(days, path),
    }
}

pub(crate) fn export_failed(path: &Path, err: impl std::fmt::Display) -> ExportError {
    ExportError::ExportFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path("out/ledger.json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path("ledger.csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path("ledger"), None);
    }
}
