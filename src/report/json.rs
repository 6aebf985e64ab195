use std::fs;
use std::path::Path;

use crate::error::{AuditError, Result};
use crate::model::AnalysisRow;

pub fn write_json(path: &Path, rows: &[AnalysisRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json).map_err(|e| AuditError::io(path, e))
}
