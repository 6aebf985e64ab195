//! End-to-end audit run.
//!
//! The stages always run in the same order:
//!
//! 1. parse the lockfile into a [`DependencyMap`](crate::DependencyMap)
//! 2. persist it as a manifest document
//! 3. read the manifest back and decode it into records
//! 4. query the registry
//! 5. join and write the report
//!
//! Only stages 1 to 3 and the final write can fail the run. Registry
//! problems show up as `Unknown` cells in the report.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::info;

use crate::error::Result;
use crate::lockfile::LockfileParser;
use crate::manifest;
use crate::model::{AnalysisRow, DependencyRecord};
use crate::registry::RegistryClient;
use crate::report::{ReportFormat, ReportGenerator, ReportSummary};

/// Inputs and outputs of one run.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Lockfile to parse. Without one, `manifest_path` must already exist.
    pub lockfile: Option<PathBuf>,
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub format: ReportFormat,
}

#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub rows: Vec<AnalysisRow>,
    pub summary: ReportSummary,
    pub output_path: PathBuf,
}

/// Parses `lockfile` and writes its manifest to `manifest_path`.
///
/// Returns the number of dependencies written.
pub fn generate_manifest(lockfile: &Path, manifest_path: &Path) -> Result<usize> {
    let dependencies = LockfileParser::new().parse_file(lockfile)?;
    let document = manifest::write_manifest(manifest_path, &dependencies)?;
    Ok(document.entries().len())
}

/// Reads and decodes a persisted manifest.
pub fn load_records(manifest_path: &Path) -> Result<Vec<DependencyRecord>> {
    let document = manifest::read_manifest(manifest_path)?;
    Ok(manifest::decode(&document))
}

/// Runs the full audit and writes the report.
pub async fn run_audit(
    options: &AuditOptions,
    client: &RegistryClient,
    progress: &ProgressBar,
) -> Result<AuditOutcome> {
    if let Some(lockfile) = &options.lockfile {
        let count = generate_manifest(lockfile, &options.manifest_path)?;
        info!(
            lockfile = %lockfile.display(),
            manifest = %options.manifest_path.display(),
            dependencies = count,
            "generated manifest"
        );
    }

    let records = load_records(&options.manifest_path)?;
    info!(dependencies = records.len(), "loaded manifest");

    progress.set_length(records.len() as u64);
    let results = client.resolve_all(&records, progress).await;
    progress.finish_and_clear();

    let rows = ReportGenerator::join(&records, &results);
    ReportGenerator::new(options.format).write(&options.output_path, &rows)?;

    Ok(AuditOutcome {
        summary: ReportSummary::from_rows(&rows),
        rows,
        output_path: options.output_path.clone(),
    })
}
