//! Aggregate models consumed by downstream reporting

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::dependency::{Ecosystem, EcosystemReport};
use crate::domain::vulnerability::VulnerabilityFinding;

/// Summary counts produced per repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDependencySummary {
    /// Headline metric: direct dependencies only, dev and indirect excluded.
    pub total_dependencies: usize,
    /// Full count including dev + indirect, for detailed views.
    pub total_dependencies_all: usize,
    /// Unique `(ecosystem, name)` pairs with at least one non-dev finding.
    /// A package vulnerable only in its dev role does not count here, even
    /// though its findings still appear in the detailed list.
    pub vulnerable_packages: usize,
    /// Cleaned license label -> occurrence count across all resolved
    /// packages (direct+dev+indirect).
    pub license_distribution: BTreeMap<String, usize>,
}

/// The full analysis result for one repository.
///
/// Self-contained and independent of any other repository's analysis; a
/// partially failed analysis still yields a valid (zero-filled or
/// Unknown-labeled) instance rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub dependencies: BTreeMap<Ecosystem, EcosystemReport>,
    pub vulnerabilities: Vec<VulnerabilityFinding>,
    pub summary: RepositoryDependencySummary,
}

impl RepositoryAnalysis {
    /// The license distribution histogram.
    pub fn licenses(&self) -> &BTreeMap<String, usize> {
        &self.summary.license_distribution
    }
}
