//! Error types.
//!
//! [`AuditError`] covers the fatal boundaries of a run: the input lockfile,
//! the manifest's structural contract, and writing outputs. [`RegistryError`]
//! describes why a single registry lookup could not be resolved. It never
//! escapes the registry client; it is carried inside
//! [`Lookup::Unknown`](crate::registry::Lookup) and logged.

use std::path::PathBuf;
use std::time::Duration;

/// Fatal errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The lockfile is missing or unreadable.
    #[error("failed to read lockfile {path}: {source}")]
    Lockfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest document does not have the expected shape.
    #[error("malformed manifest: {message}")]
    Structural { message: String },

    /// The manifest document could not be rendered.
    #[error("failed to serialize manifest: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing an intermediate or output file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV writer failed.
    #[error("failed to write report: {0}")]
    Report(#[from] csv::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configuration file could not be loaded or saved.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AuditError> = std::result::Result<T, E>;

/// Reasons a registry lookup degraded to `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("registry returned HTTP {status}")]
    Status { status: u16 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("no \"latest\" dist-tag in registry metadata")]
    MissingLatest,
}

impl RegistryError {
    /// Classifies a transport-level failure.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}
