//! Dependency entities: per-ecosystem parse reports and flattened records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value_objects::{DependencyScope, Ecosystem, UNKNOWN_VERSION};

/// Version and provenance details for one declared package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetail {
    /// Resolved/locked version, or [`UNKNOWN_VERSION`] when no concrete
    /// version could be extracted from the constraint.
    pub version: String,
    /// Raw declared constraint/range string as it appears in the manifest.
    pub constraint: String,
    /// Which file supplied this entry (diagnostics only).
    pub source: String,
}

impl PackageDetail {
    pub fn new(
        version: impl Into<String>,
        constraint: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            constraint: constraint.into(),
            source: source.into(),
        }
    }
}

/// The result of scanning one ecosystem's manifest and lock files.
///
/// Lockfile data, when present, overrides manifest-declared versions for the
/// same name; a lock entry never downgrades to a manifest constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemReport {
    /// Whether any known dependency file existed, even if parsing it failed.
    pub detected: bool,
    /// Direct production dependencies.
    pub packages: BTreeMap<String, PackageDetail>,
    /// Development/optional dependencies.
    pub dev_packages: BTreeMap<String, PackageDetail>,
    /// Transitive dependencies discovered only via a lockfile.
    pub indirect_packages: BTreeMap<String, PackageDetail>,
    /// Dependency files that were found under the repository root.
    pub package_files: Vec<String>,
    /// First non-fatal parse failure, if any.
    pub error: Option<String>,
}

impl EcosystemReport {
    /// Record a non-fatal parse failure without discarding partial results.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.error = Some(message),
        }
    }

    /// Number of direct dependencies (the headline count input).
    pub fn direct_count(&self) -> usize {
        self.packages.len()
    }
}

/// One declared dependency occurrence, flattened out of an [`EcosystemReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub ecosystem: Ecosystem,
    pub version: String,
    pub constraint: String,
    pub scope: DependencyScope,
    pub source: String,
}

impl DependencyRecord {
    pub fn is_dev(&self) -> bool {
        self.scope == DependencyScope::Dev
    }

    /// Whether a concrete version was extracted; records without one are
    /// never sent to the advisory database.
    pub fn has_known_version(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }
}

/// Flatten per-ecosystem reports into one uniform record list.
///
/// Emits direct, then dev, then indirect entries per detected ecosystem.
/// No cross-ecosystem deduplication: a name that coincidentally collides
/// across ecosystems stays distinguished by `(ecosystem, name)`.
pub fn flatten_dependencies(
    reports: &BTreeMap<Ecosystem, EcosystemReport>,
) -> Vec<DependencyRecord> {
    let mut records = Vec::new();

    for (&ecosystem, report) in reports {
        if !report.detected {
            continue;
        }

        let sections = [
            (&report.packages, DependencyScope::Direct),
            (&report.dev_packages, DependencyScope::Dev),
            (&report.indirect_packages, DependencyScope::Indirect),
        ];

        for (section, scope) in sections {
            for (name, detail) in section {
                records.push(DependencyRecord {
                    name: name.clone(),
                    ecosystem,
                    version: detail.version.clone(),
                    constraint: detail.constraint.clone(),
                    scope,
                    source: detail.source.clone(),
                });
            }
        }
    }

    records
}
