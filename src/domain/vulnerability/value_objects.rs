//! Value objects for the vulnerability domain

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized severity taxonomy.
///
/// Every advisory source (OSV textual labels, ecosystem-specific labels,
/// CVSS scores, GHSA) is reduced to one of these five levels. A finding's
/// severity is never absent: when the full fallback chain yields nothing,
/// the level is `Unknown`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Rank used when picking the highest severity among several labels.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }

    /// Normalize a textual label from an advisory payload.
    ///
    /// `Moderate` and `Medium` both map to [`Severity::Medium`]; labels
    /// outside the taxonomy yield `None` so the caller can continue down
    /// its fallback chain.
    pub fn from_label(label: &str) -> Option<Severity> {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MODERATE" | "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Bucket a numeric CVSS score.
    pub fn from_score(score: f64) -> Severity {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else if score > 0.0 {
            Severity::Low
        } else {
            Severity::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CVSS encoding version attached to a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CvssType {
    #[serde(rename = "CVSS_V3")]
    CvssV3,
    #[serde(rename = "CVSS_V2")]
    CvssV2,
}

impl fmt::Display for CvssType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvssType::CvssV3 => f.write_str("CVSS_V3"),
            CvssType::CvssV2 => f.write_str("CVSS_V2"),
        }
    }
}
