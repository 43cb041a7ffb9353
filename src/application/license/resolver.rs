//! License resolver: virtual-package shortcuts, composer fast path,
//! registry fallback, and the license distribution histogram

use moka::future::Cache;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::domain::dependency::{DependencyRecord, Ecosystem};
use crate::domain::license::{is_virtual_package, LicenseRecord, LicenseSource};
use crate::infrastructure::composer::ComposerLicenseProvider;
use crate::infrastructure::registries::LicenseRegistryClient;

/// Attaches a cleaned license label to every package in the flattened
/// dependency list (direct+dev+indirect, all ecosystems).
///
/// Lookup failure is never fatal: any error degrades to an `Unknown` record
/// carrying the error text. Results are cached by `(ecosystem, name)` rather
/// than by version, since a license rarely varies per-version and the same
/// package routinely recurs across scopes and repositories within a run.
pub struct LicenseResolver {
    registries: HashMap<Ecosystem, Box<dyn LicenseRegistryClient>>,
    composer: ComposerLicenseProvider,
    cache: Cache<String, LicenseRecord>,
}

impl LicenseResolver {
    pub fn new(
        registries: Vec<Box<dyn LicenseRegistryClient>>,
        composer: ComposerLicenseProvider,
        analysis: &AnalysisConfig,
    ) -> Self {
        Self {
            registries: registries
                .into_iter()
                .map(|client| (client.ecosystem(), client))
                .collect(),
            composer,
            cache: Cache::new(analysis.cache_max_entries),
        }
    }

    fn cache_key(ecosystem: Ecosystem, name: &str) -> String {
        format!("{}:{}", ecosystem.canonical_name(), name)
    }

    /// Resolve every package's license and build the distribution histogram.
    ///
    /// The histogram counts all resolved packages, duplicates across
    /// dev/indirect scope included.
    pub async fn collect(
        &self,
        records: &[DependencyRecord],
        repo_root: &Path,
    ) -> BTreeMap<String, usize> {
        tracing::debug!(count = records.len(), "starting license detection");

        // PHP fast path: one composer pass covers most of the lockfile.
        let composer_licenses = if records.iter().any(|r| r.ecosystem == Ecosystem::Php) {
            let licenses = self.composer.collect(repo_root).await;
            if !licenses.is_empty() {
                tracing::debug!(count = licenses.len(), "composer license data found");
            }
            licenses
        } else {
            BTreeMap::new()
        };

        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();

        for record in records {
            let key = Self::cache_key(record.ecosystem, &record.name);

            let license = match self.cache.get(&key).await {
                Some(cached) => cached,
                None => {
                    let resolved = self.resolve_uncached(record, &composer_licenses).await;
                    self.cache.insert(key, resolved.clone()).await;
                    resolved
                }
            };

            let bucket = if license.is_known() {
                license.license.clone()
            } else {
                "Unknown".to_string()
            };
            *distribution.entry(bucket).or_insert(0) += 1;
        }

        tracing::debug!(distribution = ?distribution, "license distribution summary");
        distribution
    }

    async fn resolve_uncached(
        &self,
        record: &DependencyRecord,
        composer_licenses: &BTreeMap<String, LicenseRecord>,
    ) -> LicenseRecord {
        if record.ecosystem == Ecosystem::Php {
            if let Some(license) = composer_licenses.get(&record.name) {
                tracing::debug!(package = %record.name, license = %license.license, "license from composer");
                return license.clone();
            }
        }

        if is_virtual_package(record.ecosystem, &record.name) {
            return LicenseRecord::new(
                "Virtual Package",
                "This is a virtual/meta package",
                LicenseSource::VirtualPackage,
            );
        }

        let Some(registry) = self.registries.get(&record.ecosystem) else {
            return LicenseRecord::unknown(
                format!("no registry for ecosystem {}", record.ecosystem),
                LicenseSource::RegistryError,
            );
        };

        match registry.fetch_license(&record.name).await {
            Ok(license) => license,
            Err(e) => {
                tracing::warn!(
                    package = %record.name,
                    ecosystem = %record.ecosystem,
                    error = %e,
                    "license lookup failed"
                );
                LicenseRecord::degraded(e)
            }
        }
    }
}
