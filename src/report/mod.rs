//! Audit report generation.
//!
//! [`ReportGenerator::join`] pairs each dependency record with what the
//! registry reported for it. The resulting rows are written as CSV (the
//! default) or JSON, always with the columns
//! `name, current_version, latest_version, security_issues`.

mod csv;
mod json;
mod table;

pub use self::csv::{write_csv, REPORT_HEADER};
pub use self::json::write_json;
pub use self::table::print_table;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::model::{AnalysisRow, DependencyRecord, SecurityFlag, UNKNOWN};
use crate::registry::RegistryResults;

/// File format of the written report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'csv' or 'json'", s)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ReportGenerator {
    format: ReportFormat,
}

impl ReportGenerator {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Builds one row per record, in record order.
    pub fn join(records: &[DependencyRecord], results: &RegistryResults) -> Vec<AnalysisRow> {
        records
            .iter()
            .map(|record| {
                AnalysisRow::new(
                    record,
                    results.latest_version(&record.name),
                    results.security_flag(&record.name),
                )
            })
            .collect()
    }

    /// Writes `rows` to `path`, replacing any previous report.
    pub fn write(&self, path: &Path, rows: &[AnalysisRow]) -> Result<()> {
        match self.format {
            ReportFormat::Csv => write_csv(path, rows)?,
            ReportFormat::Json => write_json(path, rows)?,
        }
        info!(path = %path.display(), rows = rows.len(), "wrote report");
        Ok(())
    }
}

/// Counts over a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub outdated: usize,
    pub vulnerable: usize,
    /// Rows with at least one field the registry could not resolve.
    pub unknown: usize,
}

impl ReportSummary {
    pub fn from_rows(rows: &[AnalysisRow]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Self::default()
        };

        for row in rows {
            if is_newer(&row.latest_version, &row.current_version) {
                summary.outdated += 1;
            }
            if row.security_issues == SecurityFlag::Yes {
                summary.vulnerable += 1;
            }
            if row.latest_version == UNKNOWN || row.security_issues == SecurityFlag::Unknown {
                summary.unknown += 1;
            }
        }

        summary
    }
}

/// Whether `latest` is a newer release than `current`.
pub fn is_newer(latest: &str, current: &str) -> bool {
    if latest == UNKNOWN || current == UNKNOWN {
        return false;
    }

    if let (Ok(latest_ver), Ok(current_ver)) = (
        semver::Version::parse(latest.trim_start_matches('v')),
        semver::Version::parse(current.trim_start_matches('v')),
    ) {
        return latest_ver > current_ver;
    }

    // Non-semver versions (git refs, tags): any difference counts
    latest != current
}
