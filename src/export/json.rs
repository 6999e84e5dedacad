use std::io::Write;
use std::path::Path;

use super::export_failed;
use crate::error::ExportError;
use crate::ledger::LedgerDay;

/// Pretty-printed JSON array of ledger days
pub fn ledger_to_json(days: &[LedgerDay]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(days)
}

pub fn export_ledger_json(days: &[LedgerDay], path: &Path) -> Result<(), ExportError> {
    let json_data = ledger_to_json(days).map_err(|e| export_failed(path, e))?;

    let mut file = std::fs::File::create(path).map_err(|e| export_failed(path, e))?;
    file.write_all(json_data.as_bytes())
        .map_err(|e| export_failed(path, e))?;

    Ok(())
}
