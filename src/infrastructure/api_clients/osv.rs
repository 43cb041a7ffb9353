//! OSV (Open Source Vulnerabilities) API client

use reqwest::Client;
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::config::OsvApiConfig;
use crate::domain::dependency::Ecosystem;

use super::models::{OsvBatchResponse, OsvQuery, OsvQueryResponse, OsvVulnerability};

/// Client for the OSV REST API: `querybatch`, `query`, and `vulns/{id}`.
///
/// The client performs single requests only; chunking, retries, and caching
/// belong to the vulnerability resolver.
pub struct OsvClient {
    client: Client,
    batch_client: Client,
    base_url: String,
}

impl OsvClient {
    pub fn new(config: &OsvApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Batch requests carry up to 100 queries and get a larger timeout.
        let batch_client = Client::builder()
            .timeout(Duration::from_secs(config.batch_timeout_seconds))
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            batch_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issue one `querybatch` request.
    ///
    /// The response's `results` array aligns by index with `queries`; a
    /// missing `vulns` list means no known advisories for that query.
    pub async fn query_batch(
        &self,
        queries: &[OsvQuery],
    ) -> Result<Vec<Vec<OsvVulnerability>>, ApiError> {
        let url = format!("{}/querybatch", self.base_url);
        let body = serde_json::json!({ "queries": queries });

        let response = self.batch_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        let batch: OsvBatchResponse = response.json().await?;
        Ok(batch
            .results
            .into_iter()
            .map(|r| r.vulns.unwrap_or_default())
            .collect())
    }

    /// Query advisories for a single package version.
    pub async fn query_single(
        &self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Result<Vec<OsvVulnerability>, ApiError> {
        let url = format!("{}/query", self.base_url);
        let query = OsvQuery::new(ecosystem, name, version);

        let response = self.client.post(&url).json(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        let data: OsvQueryResponse = response.json().await?;
        Ok(data.vulns.unwrap_or_default())
    }

    /// Fetch the full advisory record by id for richer severity/CVSS fields.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<OsvVulnerability>, ApiError> {
        let url = format!("{}/vulns/{}", self.base_url, id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let vuln: OsvVulnerability = response.json().await?;
        Ok(Some(vuln))
    }
}
