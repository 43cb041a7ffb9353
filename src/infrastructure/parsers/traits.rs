//! Traits for per-ecosystem dependency scanners

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::dependency::{Ecosystem, EcosystemReport, LanguageInfo};

/// Trait for scanning one ecosystem's dependency files under a repository root.
///
/// Scanners never fail: missing files mean `detected = false`, malformed
/// files record a non-fatal error string on the report.
pub trait EcosystemScanner: Send + Sync {
    /// The ecosystem this scanner handles.
    fn ecosystem(&self) -> Ecosystem;

    /// Detect and parse this ecosystem's manifest and lock files.
    fn scan(&self, repo_root: &Path) -> EcosystemReport;
}

/// Registry of all available scanners, gated by upstream language detection.
pub struct ScannerRegistry {
    scanners: Vec<Box<dyn EcosystemScanner>>,
}

impl ScannerRegistry {
    /// Create a registry with all available scanners.
    pub fn new() -> Self {
        Self {
            scanners: vec![
                Box::new(super::php::ComposerScanner::new()),
                Box::new(super::python::PythonScanner::new()),
                Box::new(super::go::GoModScanner::new()),
            ],
        }
    }

    /// Run every scanner whose ecosystem was detected upstream.
    pub fn scan_detected(
        &self,
        repo_root: &Path,
        language_info: &LanguageInfo,
    ) -> BTreeMap<Ecosystem, EcosystemReport> {
        let mut reports = BTreeMap::new();

        for scanner in &self.scanners {
            let ecosystem = scanner.ecosystem();
            if !language_info.detects(ecosystem) {
                continue;
            }
            reports.insert(ecosystem, scanner.scan(repo_root));
        }

        reports
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
