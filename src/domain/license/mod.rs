//! License domain: resolved records, provenance tags, and text cleaning

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::dependency::Ecosystem;

/// Which resolution path produced a [`LicenseRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseSource {
    ComposerLock,
    ComposerCommand,
    VirtualPackage,
    PypiLicenseField,
    PypiClassifier,
    PypiLicenseExpression,
    PypiNotFound,
    Packagist,
    PackagistNotFound,
    GolangNoData,
    RegistryError,
}

impl fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            LicenseSource::ComposerLock => "composer_lock",
            LicenseSource::ComposerCommand => "composer_command",
            LicenseSource::VirtualPackage => "virtual_package",
            LicenseSource::PypiLicenseField => "pypi_license_field",
            LicenseSource::PypiClassifier => "pypi_classifier",
            LicenseSource::PypiLicenseExpression => "pypi_license_expression",
            LicenseSource::PypiNotFound => "pypi_not_found",
            LicenseSource::Packagist => "packagist",
            LicenseSource::PackagistNotFound => "packagist_not_found",
            LicenseSource::GolangNoData => "golang_no_data",
            LicenseSource::RegistryError => "registry_error",
        };
        f.write_str(tag)
    }
}

/// Resolved license info for one `(ecosystem, name)` pair.
///
/// Resolution never fails: lookup errors degrade to a record with
/// `license = "Unknown"` carrying the error text in `raw_license`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Cleaned, human-readable label (possibly `"Unknown"`).
    pub license: String,
    /// Unprocessed source text/classifier/array, preserved for audit.
    pub raw_license: String,
    pub source: LicenseSource,
}

impl LicenseRecord {
    pub fn new(
        license: impl Into<String>,
        raw_license: impl Into<String>,
        source: LicenseSource,
    ) -> Self {
        Self {
            license: license.into(),
            raw_license: raw_license.into(),
            source,
        }
    }

    /// An `Unknown` record with an explanation of why resolution came up empty.
    pub fn unknown(raw_license: impl Into<String>, source: LicenseSource) -> Self {
        Self::new("Unknown", raw_license, source)
    }

    /// An `Unknown` record produced by a degraded lookup.
    pub fn degraded(error: impl fmt::Display) -> Self {
        Self::unknown(format!("API Error: {}", error), LicenseSource::RegistryError)
    }

    pub fn is_known(&self) -> bool {
        !self.license.is_empty() && self.license != "Unknown"
    }
}

/// Known virtual/meta packages that short-circuit to a fixed label without
/// any network call.
pub fn is_virtual_package(ecosystem: Ecosystem, name: &str) -> bool {
    let virtual_packages: &[&str] = match ecosystem {
        Ecosystem::Php => &["composer-runtime-api", "composer-plugin-api", "php"],
        Ecosystem::Python => &["python"],
        Ecosystem::Golang => &[],
    };
    virtual_packages.contains(&name)
}

/// Common long-form license texts mapped to short names. Order matters:
/// BSD-3-Clause must be tried before the bare BSD pattern, MIT License
/// before bare MIT.
static LICENSE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)BSD.*3.*Clause", "BSD-3-Clause"),
        (r"(?i)BSD.*2.*Clause", "BSD-2-Clause"),
        (
            r"(?i)Copyright.*Redistribution and use in source and binary forms",
            "BSD",
        ),
        (r"(?i)Apache.*License.*Version.*2", "Apache-2.0"),
        (r"(?i)GPL.*v?3", "GPL-3.0"),
        (r"(?i)GPL.*v?2", "GPL-2.0"),
        (r"(?i)MIT License", "MIT"),
        (r"(?i)MIT", "MIT"),
        (r"(?i)LGPL", "LGPL"),
        (r"(?i)ISC", "ISC"),
        (r"(?i)Mozilla", "MPL"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

/// Clean a license value for display.
///
/// Registry `license` fields sometimes contain the entire license body; texts
/// over 100 chars are pattern-matched against common licenses, falling back
/// to the first line (when short enough) or a truncation.
pub fn clean_license_text(text: &str) -> String {
    if text.len() <= 100 {
        return text.to_string();
    }

    for (pattern, name) in LICENSE_PATTERNS.iter() {
        if pattern.is_match(text) {
            return name.to_string();
        }
    }

    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.len() <= 50 {
        first_line.to_string()
    } else {
        let truncated: String = text.chars().take(47).collect();
        format!("{}...", truncated)
    }
}

/// Normalize the common PyPI `License ::` classifier names.
pub fn normalize_classifier_name(name: &str) -> &str {
    match name {
        "MIT License" => "MIT",
        "BSD License" => "BSD",
        "Apache Software License" => "Apache-2.0",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_passes_through() {
        assert_eq!(clean_license_text("MIT"), "MIT");
        assert_eq!(clean_license_text("Apache-2.0 OR MIT"), "Apache-2.0 OR MIT");
    }

    #[test]
    fn test_long_text_pattern_match() {
        let bsd3 = format!(
            "BSD 3-Clause License{}Redistribution and use in source...",
            " ".repeat(100)
        );
        assert_eq!(clean_license_text(&bsd3), "BSD-3-Clause");

        let mit = format!("MIT License{}Permission is hereby granted...", " ".repeat(100));
        assert_eq!(clean_license_text(&mit), "MIT");

        let apache = format!(
            "Apache License, Version 2.0{}Licensed under the Apache License...",
            " ".repeat(100)
        );
        assert_eq!(clean_license_text(&apache), "Apache-2.0");
    }

    #[test]
    fn test_long_unrecognized_falls_back_to_first_line() {
        let text = format!("Custom Corp License v7\n{}", "x".repeat(200));
        assert_eq!(clean_license_text(&text), "Custom Corp License v7");
    }

    #[test]
    fn test_long_unrecognized_truncates() {
        let text = "z".repeat(200);
        let cleaned = clean_license_text(&text);
        assert_eq!(cleaned.len(), 50);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_classifier_normalization() {
        assert_eq!(normalize_classifier_name("MIT License"), "MIT");
        assert_eq!(normalize_classifier_name("BSD License"), "BSD");
        assert_eq!(
            normalize_classifier_name("Apache Software License"),
            "Apache-2.0"
        );
        assert_eq!(
            normalize_classifier_name("GNU General Public License v3 (GPLv3)"),
            "GNU General Public License v3 (GPLv3)"
        );
    }

    #[test]
    fn test_virtual_packages() {
        assert!(is_virtual_package(Ecosystem::Php, "php"));
        assert!(is_virtual_package(Ecosystem::Php, "composer-runtime-api"));
        assert!(is_virtual_package(Ecosystem::Python, "python"));
        assert!(!is_virtual_package(Ecosystem::Php, "guzzlehttp/guzzle"));
        assert!(!is_virtual_package(Ecosystem::Golang, "php"));
    }
}
