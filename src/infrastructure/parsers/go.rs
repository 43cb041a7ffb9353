//! Go ecosystem scanner: go.mod

use std::path::Path;

use crate::domain::dependency::{Ecosystem, EcosystemReport, PackageDetail};

use super::traits::EcosystemScanner;

/// Scanner for Go modules.
///
/// Handles both `require (...)` blocks and standalone `require name version`
/// lines. A trailing `// indirect` comment classifies the entry as
/// transitive regardless of where the line appears.
pub struct GoModScanner;

impl Default for GoModScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl GoModScanner {
    pub fn new() -> Self {
        Self
    }

    fn parse_go_mod(content: &str, report: &mut EcosystemReport) {
        let mut in_require_block = false;

        for line in content.lines() {
            let line = line.trim();

            if !in_require_block {
                if line.starts_with("require") && line.ends_with('(') {
                    in_require_block = true;
                    continue;
                }

                if let Some(body) = line.strip_prefix("require ") {
                    if !body.contains('(') {
                        Self::record_require_line(body, report);
                    }
                }
                continue;
            }

            if line == ")" {
                in_require_block = false;
                continue;
            }

            Self::record_require_line(line, report);
        }
    }

    fn record_require_line(line: &str, report: &mut EcosystemReport) {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return;
        }

        let (entry, comment) = match line.split_once("//") {
            Some((entry, comment)) => (entry.trim(), comment.trim()),
            None => (line, ""),
        };
        let is_indirect = comment.starts_with("indirect");

        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version_token)) = (parts.next(), parts.next()) else {
            return;
        };

        let version = version_token.strip_prefix('v').unwrap_or(version_token);
        let detail = PackageDetail::new(version, version_token, "go.mod");

        if is_indirect {
            report.indirect_packages.insert(name.to_string(), detail);
        } else {
            report.packages.insert(name.to_string(), detail);
        }
    }
}

impl EcosystemScanner for GoModScanner {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }

    fn scan(&self, repo_root: &Path) -> EcosystemReport {
        let mut report = EcosystemReport::default();

        let go_mod = repo_root.join("go.mod");
        if !go_mod.exists() {
            return report;
        }

        report.detected = true;
        report.package_files.push("go.mod".to_string());

        match std::fs::read_to_string(&go_mod) {
            Ok(content) => Self::parse_go_mod(&content, &mut report),
            Err(e) => report.record_error(format!("Failed to parse go.mod: {}", e)),
        }

        report
    }
}
