pub mod config;
pub mod error;
pub mod lockfile;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod report;

pub use config::Config;
pub use error::{AuditError, RegistryError};
pub use lockfile::LockfileParser;
pub use manifest::ManifestDocument;
pub use model::{AnalysisRow, DependencyMap, DependencyRecord, SecurityFlag, UNKNOWN};
pub use registry::{AdvisoryStrategy, Lookup, RegistryClient, RegistryConfig};
pub use report::{ReportFormat, ReportGenerator, ReportSummary};
