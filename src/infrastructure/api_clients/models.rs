//! Wire models for the OSV advisory API
//!
//! OSV records vary considerably in shape across source databases; anything
//! beyond the stable identity fields is kept loosely typed and interpreted
//! by the severity strategy chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::dependency::Ecosystem;

/// One query in a `querybatch` request.
#[derive(Debug, Clone, Serialize)]
pub struct OsvQuery {
    pub package: OsvPackage,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OsvPackage {
    pub name: String,
    pub ecosystem: String,
}

impl OsvQuery {
    pub fn new(ecosystem: Ecosystem, name: &str, version: &str) -> Self {
        Self {
            package: OsvPackage {
                name: name.to_string(),
                ecosystem: ecosystem.osv_name().to_string(),
            },
            version: version.to_string(),
        }
    }
}

/// Response to a `querybatch` request; `results` aligns by index with the
/// request's `queries` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvBatchResponse {
    #[serde(default)]
    pub results: Vec<OsvBatchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvBatchResult {
    #[serde(default)]
    pub vulns: Option<Vec<OsvVulnerability>>,
}

/// Response to a single `query` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvQueryResponse {
    #[serde(default)]
    pub vulns: Option<Vec<OsvVulnerability>>,
}

/// One OSV vulnerability record.
///
/// Batch results carry abbreviated records (often little more than an id);
/// the by-id endpoint returns the full payload. Both deserialize into this
/// shape, with absent fields defaulting to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvVulnerability {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// CVSS entries: `{type, score}` where `score` may be a number or a
    /// vector string.
    #[serde(default)]
    pub severity: Vec<OsvSeverityEntry>,
    #[serde(default)]
    pub database_specific: Option<Value>,
    #[serde(default)]
    pub affected: Vec<OsvAffected>,
    /// Some databases embed a top-level `cvss` object instead.
    #[serde(default)]
    pub cvss: Option<Value>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvSeverityEntry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvAffected {
    #[serde(default)]
    pub ecosystem_specific: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviated_batch_record_deserializes() {
        let json = r#"{"results": [{"vulns": [{"id": "GHSA-aaaa-bbbb-cccc", "modified": "2024-01-01T00:00:00Z"}]}, {}]}"#;
        let response: OsvBatchResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.results.len(), 2);
        let vulns = response.results[0].vulns.as_ref().unwrap();
        assert_eq!(vulns[0].id.as_deref(), Some("GHSA-aaaa-bbbb-cccc"));
        assert!(vulns[0].severity.is_empty());
        assert!(response.results[1].vulns.is_none());
    }

    #[test]
    fn test_full_record_deserializes() {
        let json = r#"
        {
            "id": "GHSA-aaaa-bbbb-cccc",
            "summary": "Something bad",
            "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L"}],
            "database_specific": {"severity": "HIGH"},
            "affected": [{"ecosystem_specific": {"severity": "MODERATE"}}]
        }
        "#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();

        assert_eq!(vuln.severity.len(), 1);
        assert_eq!(vuln.severity[0].kind.as_deref(), Some("CVSS_V3"));
        assert_eq!(vuln.affected.len(), 1);
    }

    #[test]
    fn test_query_serializes_osv_ecosystem_names() {
        let query = OsvQuery::new(Ecosystem::Php, "guzzlehttp/guzzle", "7.0");
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["package"]["ecosystem"], "Packagist");
        assert_eq!(json["package"]["name"], "guzzlehttp/guzzle");
        assert_eq!(json["version"], "7.0");
    }
}
