//! Composer-based license collection for PHP packages
//!
//! Fast path before any registry call: composer.lock carries `license`
//! fields for most installed packages, and a locally available `composer`
//! executable can fill remaining gaps. Both passes are best-effort; any
//! failure leaves resolution to the Packagist fallback.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::domain::license::{LicenseRecord, LicenseSource};

/// Collects PHP package licenses from composer.lock and the `composer`
/// executable.
pub struct ComposerLicenseProvider {
    command: String,
    timeout: Duration,
}

impl ComposerLicenseProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_command("composer", timeout)
    }

    /// Override the executable name (used by tests to simulate absence).
    pub fn with_command(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// Collect license records for the repository's PHP packages.
    ///
    /// Strategy:
    /// 1. Parse composer.lock `license` fields for both `packages` and
    ///    `packages-dev`, without installing anything.
    /// 2. Run `composer licenses --format=json --no-dev --no-scripts
    ///    --no-plugins` to fill gaps; absence, timeout, or a non-zero exit
    ///    are logged at debug and skipped.
    ///
    /// Requires both composer.json and composer.lock to exist; otherwise
    /// returns an empty map and resolution falls through to Packagist.
    pub async fn collect(&self, repo_root: &Path) -> BTreeMap<String, LicenseRecord> {
        let mut licenses = BTreeMap::new();

        if !repo_root.join("composer.json").exists() {
            return licenses;
        }
        let lock_path = repo_root.join("composer.lock");
        if !lock_path.exists() {
            tracing::debug!("no composer.lock found, skipping composer licenses");
            return licenses;
        }

        match std::fs::read_to_string(&lock_path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
            }) {
            Ok(lock_data) => {
                Self::collect_from_lock(&lock_data, &mut licenses);
                if !licenses.is_empty() {
                    tracing::debug!(
                        count = licenses.len(),
                        "composer.lock licenses parsed"
                    );
                }
            }
            Err(e) => tracing::debug!(error = %e, "failed to parse composer.lock for licenses"),
        }

        self.fill_gaps_from_cli(repo_root, &mut licenses).await;

        licenses
    }

    fn collect_from_lock(lock_data: &Value, licenses: &mut BTreeMap<String, LicenseRecord>) {
        for section in ["packages", "packages-dev"] {
            let packages = lock_data
                .get(section)
                .and_then(|p| p.as_array())
                .map(|a| a.as_slice())
                .unwrap_or_default();

            for package in packages {
                let Some(name) = package.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                let Some(license) = package.get("license") else {
                    continue;
                };

                let license_text = match license {
                    Value::Array(items) => {
                        let parts: Vec<&str> =
                            items.iter().filter_map(|i| i.as_str()).collect();
                        if parts.is_empty() {
                            continue;
                        }
                        parts.join(" / ")
                    }
                    Value::String(s) => s.clone(),
                    _ => continue,
                };

                licenses.insert(
                    name.to_string(),
                    LicenseRecord::new(license_text, license.to_string(), LicenseSource::ComposerLock),
                );
            }
        }
    }

    /// Run `composer licenses` once and fill only entries the lockfile pass
    /// did not cover.
    async fn fill_gaps_from_cli(
        &self,
        repo_root: &Path,
        licenses: &mut BTreeMap<String, LicenseRecord>,
    ) {
        let command = tokio::process::Command::new(&self.command)
            .args(["licenses", "--format=json", "--no-dev", "--no-scripts", "--no-plugins"])
            .current_dir(repo_root)
            .output();

        let output = match tokio::time::timeout(self.timeout, command).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "composer executable unavailable, skipping CLI license pass");
                return;
            }
            Err(_) => {
                tracing::debug!("composer licenses command timed out, skipping");
                return;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(stderr = %stderr, "composer licenses returned non-zero exit");
            return;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let data: Value = match serde_json::from_str(stdout.trim()) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "failed to parse composer licenses JSON");
                return;
            }
        };

        let deps = data
            .get("dependencies")
            .and_then(|d| d.as_object())
            .cloned()
            .unwrap_or_default();

        let mut filled = 0usize;
        for (name, dep_info) in deps {
            if licenses.contains_key(&name) {
                continue;
            }

            let license_values = match &dep_info {
                Value::Object(obj) => obj.get("license").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            let parts: Vec<String> = match &license_values {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(str::to_string)
                    .collect(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            };
            if parts.is_empty() {
                continue;
            }

            licenses.insert(
                name,
                LicenseRecord::new(
                    parts.join(" / "),
                    license_values.to_string(),
                    LicenseSource::ComposerCommand,
                ),
            );
            filled += 1;
        }

        if filled > 0 {
            tracing::debug!(count = filled, "composer licenses filled missing entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn provider() -> ComposerLicenseProvider {
        // A bogus executable name exercises the graceful-absence path.
        ComposerLicenseProvider::with_command(
            "composer-executable-that-does-not-exist",
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_collect_from_lock_sections() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("composer.json"), "{}").unwrap();
        fs::write(
            tmp.path().join("composer.lock"),
            r#"
            {
                "packages": [
                    {"name": "guzzlehttp/guzzle", "version": "7.8.1", "license": ["MIT"]},
                    {"name": "vendor/unlicensed", "version": "1.0.0"}
                ],
                "packages-dev": [
                    {"name": "phpunit/phpunit", "version": "10.5.2", "license": ["BSD-3-Clause"]}
                ]
            }
            "#,
        )
        .unwrap();

        let licenses = provider().collect(tmp.path()).await;

        assert_eq!(licenses.len(), 2);
        assert_eq!(licenses["guzzlehttp/guzzle"].license, "MIT");
        assert_eq!(
            licenses["guzzlehttp/guzzle"].source,
            LicenseSource::ComposerLock
        );
        assert_eq!(licenses["phpunit/phpunit"].license, "BSD-3-Clause");
        assert!(!licenses.contains_key("vendor/unlicensed"));
    }

    #[tokio::test]
    async fn test_multiple_licenses_joined() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("composer.json"), "{}").unwrap();
        fs::write(
            tmp.path().join("composer.lock"),
            r#"{"packages": [{"name": "v/p", "license": ["MIT", "GPL-2.0-only"]}]}"#,
        )
        .unwrap();

        let licenses = provider().collect(tmp.path()).await;
        assert_eq!(licenses["v/p"].license, "MIT / GPL-2.0-only");
    }

    #[tokio::test]
    async fn test_missing_lock_yields_empty() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("composer.json"), "{}").unwrap();

        let licenses = provider().collect(tmp.path()).await;
        assert!(licenses.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lock_is_nonfatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("composer.json"), "{}").unwrap();
        fs::write(tmp.path().join("composer.lock"), "{broken").unwrap();

        let licenses = provider().collect(tmp.path()).await;
        assert!(licenses.is_empty());
    }
}
