use std::collections::HashMap;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{Lookup, RegistryClient};
use crate::error::RegistryError;

/// Abbreviated metadata; carries dist-tags without the full version documents.
const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

#[derive(Deserialize)]
struct PackageMetadata {
    #[serde(rename = "dist-tags")]
    dist_tags: Option<HashMap<String, String>>,
}

impl RegistryClient {
    /// Looks up the version the `latest` dist-tag points at.
    ///
    /// Timeouts, non-success responses and metadata without a `latest` tag
    /// resolve to [`Lookup::Unknown`].
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_latest_version(&self, name: &str) -> Lookup<String> {
        let lookup = Lookup::from(self.query_latest(name).await);

        if let Lookup::Unknown { reason } = &lookup {
            warn!(package = name, %reason, "latest version unavailable");
        }
        lookup
    }

    async fn query_latest(&self, name: &str) -> Result<String, RegistryError> {
        let url = format!("{}/{}", self.base_url(), package_path(name));
        debug!(%url, "fetching package metadata");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ABBREVIATED_METADATA)
            .send()
            .await
            .map_err(|e| RegistryError::from_reqwest(&e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
            });
        }

        let metadata: PackageMetadata = response
            .json()
            .await
            .map_err(|e| RegistryError::from_reqwest(&e, self.config.timeout))?;

        metadata
            .dist_tags
            .and_then(|mut tags| tags.remove("latest"))
            .ok_or(RegistryError::MissingLatest)
    }
}

/// Registry path for a package; the scope separator is percent-encoded.
pub(crate) fn package_path(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(scoped) => format!("@{}", scoped.replacen('/', "%2F", 1)),
        None => name.to_string(),
    }
}
