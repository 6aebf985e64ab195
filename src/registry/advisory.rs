use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use super::RegistryClient;
use crate::error::RegistryError;
use crate::model::{DependencyRecord, SecurityFlag};

const BULK_ADVISORY_PATH: &str = "/-/npm/v1/security/advisories/bulk";

/// Request body: package name to the versions being audited.
type BulkPayload<'a> = BTreeMap<&'a str, Vec<&'a str>>;

/// Response body: package name to its open advisories. Packages without
/// advisories are usually omitted.
type BulkResponse = HashMap<String, Vec<serde_json::Value>>;

impl RegistryClient {
    /// Queries advisory status for a whole batch in one request.
    ///
    /// Every member of `batch` gets an entry. If the request fails, all of
    /// them are [`SecurityFlag::Unknown`]; there is no per-item retry.
    /// Members without a known version cannot be audited and are always
    /// `Unknown`.
    pub async fn fetch_security_status(
        &self,
        batch: &[DependencyRecord],
    ) -> HashMap<String, SecurityFlag> {
        let payload = bulk_payload(batch);
        if payload.is_empty() {
            return unknown_for(batch);
        }

        match self.query_bulk(&payload).await {
            Ok(flagged) => batch
                .iter()
                .map(|record| {
                    let flag = if record.has_known_version() {
                        SecurityFlag::from_advisories(flagged.contains(&record.name))
                    } else {
                        SecurityFlag::Unknown
                    };
                    (record.name.clone(), flag)
                })
                .collect(),
            Err(reason) => {
                warn!(
                    packages = batch.len(),
                    %reason,
                    "advisory lookup failed, marking batch unknown"
                );
                unknown_for(batch)
            }
        }
    }

    async fn query_bulk(
        &self,
        payload: &BulkPayload<'_>,
    ) -> Result<HashSet<String>, RegistryError> {
        let url = format!("{}{}", self.base_url(), BULK_ADVISORY_PATH);
        debug!(%url, packages = payload.len(), "posting bulk advisory query");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RegistryError::from_reqwest(&e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
            });
        }

        let advisories: BulkResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::from_reqwest(&e, self.config.timeout))?;

        Ok(advisories
            .into_iter()
            .filter(|(_, found)| !found.is_empty())
            .map(|(name, _)| name)
            .collect())
    }
}

fn bulk_payload(batch: &[DependencyRecord]) -> BulkPayload<'_> {
    let mut payload = BulkPayload::new();
    for record in batch.iter().filter(|r| r.has_known_version()) {
        let versions = payload.entry(record.name.as_str()).or_default();
        if !versions.contains(&record.declared_version.as_str()) {
            versions.push(record.declared_version.as_str());
        }
    }
    payload
}

fn unknown_for(batch: &[DependencyRecord]) -> HashMap<String, SecurityFlag> {
    batch
        .iter()
        .map(|record| (record.name.clone(), SecurityFlag::Unknown))
        .collect()
}
