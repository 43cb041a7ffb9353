//! PHP ecosystem scanner: composer.json and composer.lock

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::application::errors::ParseError;
use crate::domain::dependency::{Ecosystem, EcosystemReport, PackageDetail};

use super::extract_version_from_constraint;
use super::traits::EcosystemScanner;

/// Scanner for Composer projects.
///
/// `composer.json` supplies declared constraints; `composer.lock`, when
/// present, overrides each known package with its locked exact version and
/// contributes transitive packages as indirect. The override never runs the
/// other way: a lock version is not replaced by a manifest constraint.
pub struct ComposerScanner;

impl Default for ComposerScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerScanner {
    pub fn new() -> Self {
        Self
    }

    /// Extract a dependency section (`require` / `require-dev`) from
    /// composer.json, skipping platform requirements (`php`, `ext-*`).
    fn parse_manifest_section(json: &Value, section: &str) -> BTreeMap<String, PackageDetail> {
        let mut packages = BTreeMap::new();

        if let Some(deps) = json.get(section).and_then(|d| d.as_object()) {
            for (name, constraint_value) in deps {
                if name.starts_with("php") || name.starts_with("ext-") {
                    continue;
                }

                let constraint = constraint_value.as_str().unwrap_or_default();
                packages.insert(
                    name.clone(),
                    PackageDetail::new(
                        extract_version_from_constraint(constraint),
                        constraint,
                        "composer.json",
                    ),
                );
            }
        }

        packages
    }

    fn parse_manifest(content: &str, report: &mut EcosystemReport) -> Result<(), ParseError> {
        let json: Value = serde_json::from_str(content)?;

        report.packages = Self::parse_manifest_section(&json, "require");
        report.dev_packages = Self::parse_manifest_section(&json, "require-dev");

        Ok(())
    }

    /// Apply composer.lock on top of the manifest-declared packages.
    ///
    /// Lock packages already known as direct get their version pinned; the
    /// rest land under indirect ("present only in lock" is the operational
    /// definition of transitive here). Dev lock packages override and extend
    /// the dev section.
    fn apply_lock(content: &str, report: &mut EcosystemReport) -> Result<(), ParseError> {
        let json: Value = serde_json::from_str(content)?;

        for package in lock_section(&json, "packages") {
            let (Some(name), Some(version)) = lock_name_version(package) else {
                continue;
            };

            if let Some(existing) = report.packages.get_mut(name) {
                existing.version = version;
                existing.source = "composer.lock".to_string();
            } else {
                report.indirect_packages.insert(
                    name.to_string(),
                    PackageDetail::new(version, "", "composer.lock"),
                );
            }
        }

        for package in lock_section(&json, "packages-dev") {
            let (Some(name), Some(version)) = lock_name_version(package) else {
                continue;
            };

            let constraint = report
                .dev_packages
                .get(name)
                .map(|d| d.constraint.clone())
                .unwrap_or_default();
            report.dev_packages.insert(
                name.to_string(),
                PackageDetail::new(version, constraint, "composer.lock"),
            );
        }

        Ok(())
    }
}

fn lock_section<'a>(json: &'a Value, section: &str) -> impl Iterator<Item = &'a Value> {
    json.get(section)
        .and_then(|p| p.as_array())
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

fn lock_name_version(package: &Value) -> (Option<&str>, Option<String>) {
    let name = package.get("name").and_then(|n| n.as_str()).filter(|n| !n.is_empty());
    let version = package
        .get("version")
        .and_then(|v| v.as_str())
        .map(|v| v.strip_prefix('v').unwrap_or(v).to_string())
        .filter(|v| !v.is_empty());
    (name, version)
}

impl EcosystemScanner for ComposerScanner {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    fn scan(&self, repo_root: &Path) -> EcosystemReport {
        let mut report = EcosystemReport::default();

        let manifest_path = repo_root.join("composer.json");
        if manifest_path.exists() {
            report.detected = true;
            report.package_files.push("composer.json".to_string());

            let parsed = std::fs::read_to_string(&manifest_path)
                .map_err(ParseError::from)
                .and_then(|content| Self::parse_manifest(&content, &mut report));
            if let Err(e) = parsed {
                report.record_error(format!("Failed to parse composer.json: {}", e));
            }
        }

        let lock_path = repo_root.join("composer.lock");
        if lock_path.exists() {
            report.package_files.push("composer.lock".to_string());

            // Lock parsing is optional; a malformed lockfile leaves the
            // manifest-declared versions in place.
            let locked = std::fs::read_to_string(&lock_path)
                .map_err(ParseError::from)
                .and_then(|content| Self::apply_lock(&content, &mut report));
            if let Err(e) = locked {
                tracing::debug!(error = %e, "failed to parse composer.lock");
            }
        }

        report
    }
}
