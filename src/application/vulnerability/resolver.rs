//! Vulnerability resolver: batch OSV queries with retry, severity
//! normalization with remote fallbacks, and per-process caching

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AnalysisConfig;
use crate::domain::dependency::{DependencyRecord, Ecosystem};
use crate::domain::vulnerability::{Advisory, CvssType, Severity, VulnerabilityFinding};
use crate::infrastructure::api_clients::models::{OsvQuery, OsvVulnerability};
use crate::infrastructure::api_clients::{GhsaAdvisory, GhsaClient, OsvClient};

use super::severity;

/// Resolves dependency records against the OSV advisory database.
///
/// Each unique `(ecosystem, name, version)` triple is queried at most once
/// per resolver lifetime; the cache is an instance field so tests and
/// per-run instantiation stay isolated. Batch chunks that fail after
/// retries degrade to "no results" and the affected records fall back to
/// single queries.
pub struct VulnerabilityResolver {
    osv: OsvClient,
    ghsa: Option<GhsaClient>,
    chunk_size: usize,
    max_attempts: u32,
    backoff: Duration,
    advisory_cache: Cache<String, Arc<Vec<Advisory>>>,
    ghsa_cache: Cache<String, GhsaAdvisory>,
}

impl VulnerabilityResolver {
    pub fn new(osv: OsvClient, ghsa: Option<GhsaClient>, analysis: &AnalysisConfig) -> Self {
        Self {
            osv,
            ghsa,
            chunk_size: analysis.batch_chunk_size,
            max_attempts: analysis.batch_max_attempts,
            backoff: analysis.batch_backoff(),
            advisory_cache: Cache::new(analysis.cache_max_entries),
            ghsa_cache: Cache::new(analysis.cache_max_entries),
        }
    }

    fn cache_key(ecosystem: Ecosystem, name: &str, version: &str) -> String {
        format!("{}:{}:{}", ecosystem.canonical_name(), name, version)
    }

    /// Resolve all records, returning one finding per (record, advisory).
    pub async fn resolve(&self, records: &[DependencyRecord]) -> Vec<VulnerabilityFinding> {
        self.run_batch_queries(records).await;

        let mut findings = Vec::new();
        for record in records.iter().filter(|r| r.has_known_version()) {
            let key = Self::cache_key(record.ecosystem, &record.name, &record.version);

            let advisories = match self.advisory_cache.get(&key).await {
                Some(cached) => cached,
                None => {
                    // Not covered by the batch path (e.g. the whole chunk
                    // degraded); fall back to a single query.
                    let advisories = match self
                        .osv
                        .query_single(record.ecosystem, &record.name, &record.version)
                        .await
                    {
                        Ok(vulns) => self.normalize_all(&vulns).await,
                        Err(e) => {
                            tracing::warn!(
                                package = %record.name,
                                version = %record.version,
                                error = %e,
                                "OSV single query failed"
                            );
                            Vec::new()
                        }
                    };
                    let advisories = Arc::new(advisories);
                    self.advisory_cache.insert(key, advisories.clone()).await;
                    advisories
                }
            };

            for advisory in advisories.iter() {
                findings.push(VulnerabilityFinding {
                    package: record.name.clone(),
                    version: record.version.clone(),
                    ecosystem: record.ecosystem,
                    advisory: advisory.clone(),
                    dev_dependency: record.is_dev(),
                });
            }
        }

        findings
    }

    /// Query the batch endpoint for every unique, uncached key.
    async fn run_batch_queries(&self, records: &[DependencyRecord]) {
        let mut pending: Vec<(String, OsvQuery)> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for record in records.iter().filter(|r| r.has_known_version()) {
            let key = Self::cache_key(record.ecosystem, &record.name, &record.version);
            if !seen.insert(key.clone()) {
                continue;
            }
            if self.advisory_cache.contains_key(&key) {
                continue;
            }
            pending.push((
                key,
                OsvQuery::new(record.ecosystem, &record.name, &record.version),
            ));
        }

        for chunk in pending.chunks(self.chunk_size) {
            let queries: Vec<OsvQuery> = chunk.iter().map(|(_, q)| q.clone()).collect();

            let mut attempt = 0u32;
            loop {
                match self.osv.query_batch(&queries).await {
                    Ok(results) => {
                        for ((key, _), vulns) in chunk.iter().zip(results) {
                            tracing::debug!(key = %key, count = vulns.len(), "OSV batch result");
                            let advisories = self.normalize_all(&vulns).await;
                            self.advisory_cache
                                .insert(key.clone(), Arc::new(advisories))
                                .await;
                        }
                        break;
                    }
                    Err(e) => {
                        attempt += 1;
                        if attempt >= self.max_attempts {
                            tracing::warn!(
                                error = %e,
                                chunk_len = chunk.len(),
                                "OSV batch query failed after retries"
                            );
                            break;
                        }
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }
    }

    async fn normalize_all(&self, vulns: &[OsvVulnerability]) -> Vec<Advisory> {
        let mut advisories = Vec::with_capacity(vulns.len());
        for vuln in vulns {
            advisories.push(self.normalize(vuln).await);
        }
        advisories
    }

    /// Normalize one OSV record into an [`Advisory`], walking the severity
    /// fallback chain: local strategies, then the full record by id, then
    /// GHSA, then `Unknown`.
    async fn normalize(&self, vuln: &OsvVulnerability) -> Advisory {
        let mut label = severity::derive_severity(vuln);
        let (mut score, mut score_type) = severity::extract_cvss(vuln);
        let mut summary = vuln.summary.clone();
        let mut published = vuln.published.clone();
        let mut modified = vuln.modified.clone();

        // Batch results are abbreviated records; refetch by id when neither
        // a label nor a score was obtainable locally.
        if label.is_none() && score.is_none() {
            if let Some(full) = self.fetch_full_record(vuln.id.as_deref()).await {
                label = severity::derive_severity(&full);
                let (full_score, full_type) = severity::extract_cvss(&full);
                if score.is_none() {
                    score = full_score;
                    score_type = score_type.or(full_type);
                }
                summary = summary.or(full.summary);
                published = published.or(full.published);
                modified = modified.or(full.modified);
            }
        }

        if label.is_none() {
            if let Some(advisory) = self.fetch_ghsa(vuln.id.as_deref()).await {
                if score.is_none() {
                    if let Some(ghsa_score) = advisory.cvss_score {
                        score = Some(ghsa_score);
                        score_type = Some(CvssType::CvssV3);
                    }
                }
                label = advisory
                    .severity
                    .as_deref()
                    .and_then(Severity::from_label);
            }
        }

        tracing::debug!(
            id = vuln.id.as_deref().unwrap_or("?"),
            label = %label.unwrap_or(Severity::Unknown),
            cvss = ?score,
            "normalized OSV advisory"
        );

        Advisory {
            id: vuln.id.clone().unwrap_or_default(),
            summary: summary.unwrap_or_else(|| "No summary available".to_string()),
            severity: label.unwrap_or(Severity::Unknown),
            cvss_score: score,
            cvss_type: score_type,
            published: parse_timestamp(published.as_deref()),
            modified: parse_timestamp(modified.as_deref()),
        }
    }

    async fn fetch_full_record(&self, id: Option<&str>) -> Option<OsvVulnerability> {
        let id = id?;
        match self.osv.fetch_by_id(id).await {
            Ok(full) => full,
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "OSV by-id fetch failed");
                None
            }
        }
    }

    /// GHSA advisories are cached by id across packages: distinct dependency
    /// versions regularly share an advisory.
    async fn fetch_ghsa(&self, id: Option<&str>) -> Option<GhsaAdvisory> {
        let id = id?;
        if !id.starts_with("GHSA-") {
            return None;
        }
        let ghsa = self.ghsa.as_ref()?;

        if let Some(cached) = self.ghsa_cache.get(id).await {
            return Some(cached);
        }

        match ghsa.fetch_advisory(id).await {
            Ok(Some(advisory)) => {
                self.ghsa_cache
                    .insert(id.to_string(), advisory.clone())
                    .await;
                Some(advisory)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "GHSA advisory fetch failed");
                None
            }
        }
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GhsaApiConfig, OsvApiConfig};
    use crate::domain::dependency::DependencyScope;
    use serde_json::json;

    fn record(
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
        scope: DependencyScope,
    ) -> DependencyRecord {
        DependencyRecord {
            name: name.to_string(),
            ecosystem,
            version: version.to_string(),
            constraint: format!("=={}", version),
            scope,
            source: "test".to_string(),
        }
    }

    fn resolver_for(server: &mockito::Server, with_ghsa: bool) -> VulnerabilityResolver {
        let osv = OsvClient::new(&OsvApiConfig {
            base_url: server.url(),
            batch_timeout_seconds: 5,
            request_timeout_seconds: 5,
        })
        .unwrap();

        let ghsa = if with_ghsa {
            GhsaClient::from_config(&GhsaApiConfig {
                graphql_url: format!("{}/graphql", server.url()),
                token: Some("test-token".to_string()),
                request_timeout_seconds: 5,
            })
            .unwrap()
        } else {
            None
        };

        let analysis = AnalysisConfig {
            batch_backoff_ms: 1,
            ..Default::default()
        };
        VulnerabilityResolver::new(osv, ghsa, &analysis)
    }

    #[tokio::test]
    async fn test_batch_severity_normalization() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{
                        "vulns": [{
                            "id": "GHSA-aaaa-bbbb-cccc",
                            "summary": "Something bad",
                            "database_specific": {"severity": "MODERATE"}
                        }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Python,
            "requests",
            "2.31.0",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].advisory.severity, Severity::Medium);
        assert_eq!(findings[0].advisory.summary, "Something bad");
        assert!(!findings[0].dev_dependency);
    }

    #[tokio::test]
    async fn test_cache_prevents_second_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"results": [{"vulns": []}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Php,
            "guzzlehttp/guzzle",
            "7.0",
            DependencyScope::Direct,
        )];

        assert!(resolver.resolve(&records).await.is_empty());
        assert!(resolver.resolve(&records).await.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_duplicate_records_query_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/querybatch")
            .match_body(mockito::Matcher::PartialJson(json!({
                "queries": [{"package": {"name": "requests", "ecosystem": "PyPI"}, "version": "2.31.0"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"results": [{"vulns": []}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        // Same package both as a direct and a dev dependency.
        let records = vec![
            record(Ecosystem::Python, "requests", "2.31.0", DependencyScope::Direct),
            record(Ecosystem::Python, "requests", "2.31.0", DependencyScope::Dev),
        ];

        resolver.resolve(&records).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_version_never_reaches_network() {
        let server = mockito::Server::new_async().await;
        let resolver = resolver_for(&server, false);

        let records = vec![record(
            Ecosystem::Python,
            "requests",
            "unknown",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_retries_then_single_query_fallback() {
        let mut server = mockito::Server::new_async().await;
        let batch_mock = server
            .mock("POST", "/querybatch")
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;
        let single_mock = server
            .mock("POST", "/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "vulns": [{
                        "id": "PYSEC-2024-1",
                        "summary": "fallback finding",
                        "database_specific": {"severity": "HIGH"}
                    }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Python,
            "requests",
            "2.31.0",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;

        batch_mock.assert_async().await;
        single_mock.assert_async().await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].advisory.severity, Severity::High);
    }

    #[tokio::test]
    async fn test_abbreviated_record_refetched_by_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{"vulns": [{"id": "PYSEC-2024-2", "modified": "2024-03-01T00:00:00Z"}]}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let by_id_mock = server
            .mock("GET", "/vulns/PYSEC-2024-2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "PYSEC-2024-2",
                    "summary": "full record",
                    "severity": [{"type": "CVSS_V3", "score": "9.8"}]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Python,
            "urllib3",
            "1.26.0",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;

        by_id_mock.assert_async().await;
        assert_eq!(findings.len(), 1);
        let advisory = &findings[0].advisory;
        assert_eq!(advisory.severity, Severity::Critical);
        assert_eq!(advisory.cvss_score, Some(9.8));
        assert_eq!(advisory.cvss_type, Some(CvssType::CvssV3));
        assert_eq!(advisory.summary, "full record");
    }

    #[tokio::test]
    async fn test_ghsa_fallback_with_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{"vulns": [{"id": "GHSA-dddd-eeee-ffff"}]}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/vulns/GHSA-dddd-eeee-ffff")
            .with_status(404)
            .create_async()
            .await;
        let ghsa_mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "securityAdvisory": {
                            "severity": "HIGH",
                            "cvss": {"score": 8.8}
                        }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver_for(&server, true);
        let records = vec![record(
            Ecosystem::Php,
            "vendor/pkg",
            "1.0.0",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;

        ghsa_mock.assert_async().await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].advisory.severity, Severity::High);
        assert_eq!(findings[0].advisory.cvss_score, Some(8.8));
    }

    #[tokio::test]
    async fn test_exhausted_chain_yields_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{"vulns": [{"id": "OSV-2024-1"}]}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/vulns/OSV-2024-1")
            .with_status(404)
            .create_async()
            .await;

        // No GHSA client configured: the chain ends at Unknown.
        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Golang,
            "github.com/x/y",
            "0.1.0",
            DependencyScope::Direct,
        )];

        let findings = resolver.resolve(&records).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].advisory.severity, Severity::Unknown);
        assert_eq!(findings[0].advisory.summary, "No summary available");
    }

    #[tokio::test]
    async fn test_dev_flag_copied_from_record() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{
                        "vulns": [{"id": "X-1", "database_specific": {"severity": "CRITICAL"}}]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resolver = resolver_for(&server, false);
        let records = vec![record(
            Ecosystem::Python,
            "pytest",
            "8.0.0",
            DependencyScope::Dev,
        )];

        let findings = resolver.resolve(&records).await;
        assert_eq!(findings.len(), 1);
        assert!(findings[0].dev_dependency);
    }
}
