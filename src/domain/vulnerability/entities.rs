//! Vulnerability entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::dependency::Ecosystem;

use super::value_objects::{CvssType, Severity};

/// One advisory record after normalization across upstream sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    /// Upstream identifier (GHSA or OSV id).
    pub id: String,
    pub summary: String,
    pub severity: Severity,
    /// Numeric CVSS score when a genuine number was obtainable; vector-only
    /// scores leave this absent while still recording the type.
    pub cvss_score: Option<f64>,
    pub cvss_type: Option<CvssType>,
    pub published: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// One resolved `(dependency record, advisory)` pair.
///
/// A single package+version may legitimately carry multiple findings; a
/// package with zero returned advisories yields zero findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityFinding {
    pub package: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub advisory: Advisory,
    /// Copied from the originating record's scope; dev-only vulnerabilities
    /// are excluded from the headline risk count.
    pub dev_dependency: bool,
}
