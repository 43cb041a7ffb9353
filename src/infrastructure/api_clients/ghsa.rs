//! GitHub Security Advisories GraphQL client
//!
//! Used as the last non-local severity fallback: when an advisory id carries
//! the `GHSA-` prefix and a GitHub token is configured, the advisory's
//! severity and CVSS score are fetched directly from GitHub.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::config::GhsaApiConfig;

const ADVISORY_QUERY: &str =
    "query($id: String!) { securityAdvisory(ghsaId: $id) { severity cvss { score vectorString } } }";

#[derive(Debug, Serialize)]
struct GraphQLRequest {
    query: String,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AdvisoryData {
    #[serde(rename = "securityAdvisory")]
    security_advisory: Option<AdvisoryNode>,
}

#[derive(Debug, Deserialize)]
struct AdvisoryNode {
    severity: Option<String>,
    cvss: Option<CvssNode>,
}

#[derive(Debug, Deserialize)]
struct CvssNode {
    score: Option<f64>,
}

/// Severity and CVSS fields of one GHSA advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct GhsaAdvisory {
    pub severity: Option<String>,
    pub cvss_score: Option<f64>,
}

/// Client for GitHub's GraphQL API, scoped to security advisory lookups.
pub struct GhsaClient {
    client: Client,
    token: String,
    graphql_url: String,
}

impl GhsaClient {
    /// Build a client from config; yields `None` when no token is configured,
    /// in which case the GHSA fallback is skipped entirely.
    pub fn from_config(config: &GhsaApiConfig) -> Result<Option<Self>, ApiError> {
        let Some(token) = config.token.as_ref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Some(Self {
            client,
            token: token.clone(),
            graphql_url: config.graphql_url.clone(),
        }))
    }

    /// Fetch one advisory by GHSA id. Non-GHSA ids resolve to `None` without
    /// a network call.
    pub async fn fetch_advisory(&self, ghsa_id: &str) -> Result<Option<GhsaAdvisory>, ApiError> {
        if !ghsa_id.starts_with("GHSA-") {
            return Ok(None);
        }

        let request = GraphQLRequest {
            query: ADVISORY_QUERY.to_string(),
            variables: serde_json::json!({ "id": ghsa_id }),
        };

        let response = self
            .client
            .post(&self.graphql_url)
            .header("Authorization", format!("bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        let body: GraphQLResponse<AdvisoryData> = response.json().await?;

        if let Some(errors) = body.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ApiError::Http {
                status: 400,
                message: format!("GraphQL request failed: {}", messages.join(" | ")),
            });
        }

        Ok(body
            .data
            .and_then(|d| d.security_advisory)
            .map(|node| GhsaAdvisory {
                severity: node.severity,
                cvss_score: node.cvss.and_then(|c| c.score),
            }))
    }
}
