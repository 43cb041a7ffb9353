//! Severity derivation from OSV advisory payloads
//!
//! Severity arrives in several mutually inconsistent shapes: a textual
//! `database_specific.severity` label, per-`affected` ecosystem labels,
//! numeric or vector-string CVSS entries, and occasionally a bare `cvss`
//! object. The strategies below are tried in a fixed order; each returns
//! `Option<Severity>` so the tie-break order stays auditable and testable
//! without any network access. Remote fallbacks (OSV by-id, GHSA) are
//! handled by the resolver, which re-runs this chain on richer payloads.

use serde_json::Value;

use crate::domain::vulnerability::{CvssType, Severity};
use crate::infrastructure::api_clients::models::OsvVulnerability;

pub type SeverityStrategy = fn(&OsvVulnerability) -> Option<Severity>;

/// The local strategy chain, in tie-break order.
pub const STRATEGIES: &[(&str, SeverityStrategy)] = &[
    ("database_specific_label", severity_from_database_label),
    ("affected_ecosystem_specific", severity_from_affected),
    ("cvss_score_bucket", severity_from_cvss_score),
];

/// Run the local strategy chain, stopping at the first success.
pub fn derive_severity(vuln: &OsvVulnerability) -> Option<Severity> {
    for (name, strategy) in STRATEGIES {
        if let Some(severity) = strategy(vuln) {
            tracing::debug!(
                id = vuln.id.as_deref().unwrap_or("?"),
                strategy = name,
                severity = %severity,
                "severity resolved"
            );
            return Some(severity);
        }
    }
    None
}

/// Strategy a: explicit textual label from `database_specific.severity`.
///
/// Labels outside the taxonomy are ignored rather than passed through, so a
/// finding's severity is always one of the five defined levels.
pub fn severity_from_database_label(vuln: &OsvVulnerability) -> Option<Severity> {
    let label = vuln
        .database_specific
        .as_ref()?
        .get("severity")?
        .as_str()?;
    Severity::from_label(label)
}

/// Strategy b: highest-ranked `affected[].ecosystem_specific.severity`.
pub fn severity_from_affected(vuln: &OsvVulnerability) -> Option<Severity> {
    vuln.affected
        .iter()
        .filter_map(|aff| {
            aff.ecosystem_specific
                .as_ref()?
                .get("severity")?
                .as_str()
                .and_then(Severity::from_label)
        })
        .max_by_key(|s| s.rank())
}

/// Strategy c: bucket a numeric CVSS score.
pub fn severity_from_cvss_score(vuln: &OsvVulnerability) -> Option<Severity> {
    extract_cvss(vuln).0.map(Severity::from_score)
}

/// Extract a CVSS score with its encoding version, preferring v3 over v2.
///
/// A severity entry whose score is a vector string (not a number) records
/// the type but yields no numeric score, and stops the search: a v2 number
/// never overrides the presence of a v3 entry. Some databases instead embed
/// a `cvss` object at the top level or under `database_specific`.
pub fn extract_cvss(vuln: &OsvVulnerability) -> (Option<f64>, Option<CvssType>) {
    for (kind_name, kind) in [("CVSS_V3", CvssType::CvssV3), ("CVSS_V2", CvssType::CvssV2)] {
        if let Some(entry) = vuln
            .severity
            .iter()
            .find(|e| e.kind.as_deref() == Some(kind_name))
        {
            return (entry.score.as_ref().and_then(numeric_score), Some(kind));
        }
    }

    for container in [vuln.cvss.as_ref(), vuln
        .database_specific
        .as_ref()
        .and_then(|d| d.get("cvss"))]
    {
        if let Some(cvss) = container {
            for key in ["score", "baseScore"] {
                if let Some(score) = cvss.get(key).and_then(numeric_score) {
                    return (Some(score), Some(CvssType::CvssV3));
                }
            }
        }
    }

    (None, None)
}

fn numeric_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
