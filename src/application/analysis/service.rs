//! Repository analysis orchestration

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::application::license::LicenseResolver;
use crate::application::vulnerability::VulnerabilityResolver;
use crate::config::Config;
use crate::domain::dependency::{flatten_dependencies, Ecosystem, LanguageInfo};
use crate::infrastructure::api_clients::{GhsaClient, OsvClient};
use crate::infrastructure::composer::ComposerLicenseProvider;
use crate::infrastructure::parsers::ScannerRegistry;
use crate::infrastructure::registries::{
    GoPkgClient, LicenseRegistryClient, PackagistClient, PypiClient,
};

use super::models::{RepositoryAnalysis, RepositoryDependencySummary};

/// Orchestrates the full dependency pipeline for one repository: manifest
/// scanning, flattening, vulnerability resolution, license resolution, and
/// the summary counts.
///
/// `analyze` is infallible by construction: every failure inside the
/// pipeline degrades to empty or Unknown-labeled data, so a repository with
/// a broken manifest or an unreachable upstream still produces a valid,
/// self-contained analysis.
pub struct RepositoryAnalysisService {
    scanners: ScannerRegistry,
    vulnerabilities: VulnerabilityResolver,
    licenses: LicenseResolver,
}

impl RepositoryAnalysisService {
    pub fn new(
        scanners: ScannerRegistry,
        vulnerabilities: VulnerabilityResolver,
        licenses: LicenseResolver,
    ) -> Self {
        Self {
            scanners,
            vulnerabilities,
            licenses,
        }
    }

    /// Wire up the service from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let osv = OsvClient::new(&config.apis.osv)?;
        let ghsa = GhsaClient::from_config(&config.apis.ghsa)?;
        let vulnerabilities = VulnerabilityResolver::new(osv, ghsa, &config.analysis);

        let registry_timeout =
            Duration::from_secs(config.apis.registries.request_timeout_seconds);
        let registries: Vec<Box<dyn LicenseRegistryClient>> = vec![
            Box::new(PypiClient::new(
                &config.apis.registries.pypi_base_url,
                registry_timeout,
            )?),
            Box::new(PackagistClient::new(
                &config.apis.registries.packagist_base_url,
                registry_timeout,
            )?),
            Box::new(GoPkgClient::new(
                &config.apis.registries.gopkg_base_url,
                registry_timeout,
            )?),
        ];
        let composer = ComposerLicenseProvider::new(config.analysis.composer_timeout());
        let licenses = LicenseResolver::new(registries, composer, &config.analysis);

        Ok(Self::new(
            ScannerRegistry::new(),
            vulnerabilities,
            licenses,
        ))
    }

    /// Analyze one repository.
    ///
    /// `language_info` gates which scanners run; ecosystems not detected
    /// upstream are never inspected.
    pub async fn analyze(
        &self,
        repo_root: &Path,
        language_info: &LanguageInfo,
    ) -> RepositoryAnalysis {
        let dependencies = self.scanners.scan_detected(repo_root, language_info);

        for (ecosystem, report) in &dependencies {
            if let Some(error) = &report.error {
                tracing::warn!(ecosystem = %ecosystem, error = %error, "dependency parsing degraded");
            }
        }

        let records = flatten_dependencies(&dependencies);
        let vulnerabilities = self.vulnerabilities.resolve(&records).await;
        let license_distribution = self.licenses.collect(&records, repo_root).await;

        // Headline risk metric: unique packages with at least one finding in
        // a non-dev role.
        let vulnerable: BTreeSet<(Ecosystem, &str)> = vulnerabilities
            .iter()
            .filter(|f| !f.dev_dependency)
            .map(|f| (f.ecosystem, f.package.as_str()))
            .collect();

        let total_dependencies = dependencies
            .values()
            .filter(|r| r.detected)
            .map(|r| r.direct_count())
            .sum();

        let summary = RepositoryDependencySummary {
            total_dependencies,
            total_dependencies_all: records.len(),
            vulnerable_packages: vulnerable.len(),
            license_distribution,
        };

        tracing::info!(
            total = summary.total_dependencies,
            total_all = summary.total_dependencies_all,
            vulnerable = summary.vulnerable_packages,
            "repository analysis complete"
        );

        RepositoryAnalysis {
            dependencies,
            vulnerabilities,
            summary,
        }
    }
}
