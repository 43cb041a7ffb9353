//! Value objects for the dependency domain

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sentinel version used when no concrete version could be extracted from a
/// declared constraint.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A package-management universe with its own manifest conventions and
/// advisory-database mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Php,
    Python,
    Golang,
}

impl Ecosystem {
    /// All supported ecosystems, in stable reporting order.
    pub fn all() -> [Ecosystem; 3] {
        [Ecosystem::Php, Ecosystem::Python, Ecosystem::Golang]
    }

    /// Ecosystem name understood by the OSV advisory database.
    pub fn osv_name(&self) -> &'static str {
        match self {
            Ecosystem::Php => "Packagist",
            Ecosystem::Python => "PyPI",
            Ecosystem::Golang => "Go",
        }
    }

    /// Lowercase canonical name used in cache keys and logs.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Ecosystem::Php => "php",
            Ecosystem::Python => "python",
            Ecosystem::Golang => "golang",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// How a dependency entered the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Declared in the primary manifest's production dependency section.
    Direct,
    /// Declared in a development/optional dependency section.
    Dev,
    /// Discovered only via a lockfile as a transitive dependency.
    Indirect,
}

/// Upstream language-detection result gating which manifest scanners run.
///
/// Supplied by the orchestrator that clones and inspects the repository; this
/// core never detects languages itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub ecosystems: BTreeSet<Ecosystem>,
}

impl LanguageInfo {
    pub fn from_ecosystems<I: IntoIterator<Item = Ecosystem>>(ecosystems: I) -> Self {
        Self {
            ecosystems: ecosystems.into_iter().collect(),
        }
    }

    /// Whether the given ecosystem was detected in the repository.
    pub fn detects(&self, ecosystem: Ecosystem) -> bool {
        self.ecosystems.contains(&ecosystem)
    }
}

impl FromIterator<Ecosystem> for LanguageInfo {
    fn from_iter<I: IntoIterator<Item = Ecosystem>>(iter: I) -> Self {
        Self::from_ecosystems(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osv_names() {
        assert_eq!(Ecosystem::Php.osv_name(), "Packagist");
        assert_eq!(Ecosystem::Python.osv_name(), "PyPI");
        assert_eq!(Ecosystem::Golang.osv_name(), "Go");
    }

    #[test]
    fn test_language_info_detects() {
        let info = LanguageInfo::from_ecosystems([Ecosystem::Php, Ecosystem::Golang]);
        assert!(info.detects(Ecosystem::Php));
        assert!(info.detects(Ecosystem::Golang));
        assert!(!info.detects(Ecosystem::Python));
    }
}
