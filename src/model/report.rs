use serde::{Deserialize, Serialize};

use super::DependencyRecord;

/// Whether open security advisories exist for a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityFlag {
    Yes,
    No,
    Unknown,
}

impl SecurityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityFlag::Yes => "Yes",
            SecurityFlag::No => "No",
            SecurityFlag::Unknown => "Unknown",
        }
    }

    pub fn from_advisories(has_advisories: bool) -> Self {
        if has_advisories {
            SecurityFlag::Yes
        } else {
            SecurityFlag::No
        }
    }
}

impl std::fmt::Display for SecurityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the audit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub security_issues: SecurityFlag,
}

impl AnalysisRow {
    pub fn new(
        record: &DependencyRecord,
        latest_version: impl Into<String>,
        security_issues: SecurityFlag,
    ) -> Self {
        Self {
            name: record.name.clone(),
            current_version: record.declared_version.clone(),
            latest_version: latest_version.into(),
            security_issues,
        }
    }
}
