use std::path::Path;

use crate::error::Result;
use crate::model::AnalysisRow;

/// Column order of the CSV report.
pub const REPORT_HEADER: [&str; 4] = [
    "name",
    "current_version",
    "latest_version",
    "security_issues",
];

/// Writes rows as CSV, truncating `path`. The header is written even when
/// `rows` is empty.
pub fn write_csv(path: &Path, rows: &[AnalysisRow]) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(REPORT_HEADER)?;
    for row in rows {
        writer.write_record([
            row.name.as_str(),
            row.current_version.as_str(),
            row.latest_version.as_str(),
            row.security_issues.as_str(),
        ])?;
    }

    writer.flush().map_err(|e| crate::error::AuditError::io(path, e))?;
    Ok(())
}
