//! Python ecosystem scanner: requirements.txt, pyproject.toml, and Pipfile

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

use crate::application::errors::ParseError;
use crate::domain::dependency::{Ecosystem, EcosystemReport, PackageDetail};

use super::extract_version_from_constraint;
use super::traits::EcosystemScanner;

static DEPENDENCY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9_.-]+)(.*)").unwrap());

/// Scanner for pip-family projects.
///
/// Up to three coexisting files are merged: requirements.txt,
/// pyproject.toml (PEP 621 plus Poetry tables), and Pipfile. Later-parsed
/// files overwrite earlier entries for the same name; there is no lockfile
/// precedence beyond parse order.
pub struct PythonScanner;

impl Default for PythonScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a dependency string such as `"requests>=2.0"` into name and
/// constraint.
fn split_dependency(dep: &str) -> Option<(String, String)> {
    let captures = DEPENDENCY_LINE.captures(dep.trim())?;
    let name = captures.get(1)?.as_str().to_string();
    let constraint = captures.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
    Some((name, constraint))
}

fn detail_for(constraint: &str, source: &str) -> PackageDetail {
    PackageDetail::new(
        extract_version_from_constraint(constraint),
        constraint,
        source,
    )
}

/// Poetry and Pipfile dependency values are either plain constraint strings
/// or inline tables carrying a `version` key.
fn constraint_from_toml(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

impl PythonScanner {
    pub fn new() -> Self {
        Self
    }

    /// Parse requirements.txt lines (`name<operator><version>`), skipping
    /// blanks, comments, and `-`-prefixed directives.
    fn parse_requirements(content: &str) -> BTreeMap<String, PackageDetail> {
        let mut packages = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                continue;
            }

            if let Some((name, constraint)) = split_dependency(line) {
                packages.insert(name, detail_for(&constraint, "requirements.txt"));
            }
        }

        packages
    }

    /// Parse pyproject.toml: `project.dependencies` (direct), every
    /// `project.optional-dependencies` group (dev), and
    /// `tool.poetry.dependencies` (direct, excluding the `python` entry).
    #[allow(clippy::type_complexity)]
    fn parse_pyproject(
        content: &str,
    ) -> Result<(BTreeMap<String, PackageDetail>, BTreeMap<String, PackageDetail>), ParseError>
    {
        let data: toml::Value = toml::from_str(content)?;
        let mut main = BTreeMap::new();
        let mut dev = BTreeMap::new();

        let project = data.get("project");

        if let Some(deps) = project
            .and_then(|p| p.get("dependencies"))
            .and_then(|d| d.as_array())
        {
            for dep in deps.iter().filter_map(|d| d.as_str()) {
                if let Some((name, constraint)) = split_dependency(dep) {
                    main.insert(name, detail_for(&constraint, "pyproject.toml"));
                }
            }
        }

        if let Some(groups) = project
            .and_then(|p| p.get("optional-dependencies"))
            .and_then(|o| o.as_table())
        {
            for (group, deps) in groups {
                let source = format!("pyproject.toml[{}]", group);
                for dep in deps.as_array().into_iter().flatten().filter_map(|d| d.as_str()) {
                    if let Some((name, constraint)) = split_dependency(dep) {
                        dev.insert(name, detail_for(&constraint, &source));
                    }
                }
            }
        }

        if let Some(poetry_deps) = data
            .get("tool")
            .and_then(|t| t.get("poetry"))
            .and_then(|p| p.get("dependencies"))
            .and_then(|d| d.as_table())
        {
            for (name, value) in poetry_deps {
                if name == "python" {
                    continue;
                }
                let constraint = constraint_from_toml(value);
                main.insert(name.clone(), detail_for(&constraint, "pyproject.toml[poetry]"));
            }
        }

        Ok((main, dev))
    }

    /// Parse Pipfile: `[packages]` (direct) and `[dev-packages]` (dev).
    #[allow(clippy::type_complexity)]
    fn parse_pipfile(
        content: &str,
    ) -> Result<(BTreeMap<String, PackageDetail>, BTreeMap<String, PackageDetail>), ParseError>
    {
        let data: toml::Value = toml::from_str(content)?;

        let section = |key: &str, source: &str| -> BTreeMap<String, PackageDetail> {
            data.get(key)
                .and_then(|p| p.as_table())
                .map(|table| {
                    table
                        .iter()
                        .map(|(name, value)| {
                            (name.clone(), detail_for(&constraint_from_toml(value), source))
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        Ok((
            section("packages", "Pipfile"),
            section("dev-packages", "Pipfile[dev]"),
        ))
    }
}

impl EcosystemScanner for PythonScanner {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn scan(&self, repo_root: &Path) -> EcosystemReport {
        let mut report = EcosystemReport::default();

        let requirements = repo_root.join("requirements.txt");
        if requirements.exists() {
            report.detected = true;
            report.package_files.push("requirements.txt".to_string());

            match std::fs::read_to_string(&requirements) {
                Ok(content) => report.packages.extend(Self::parse_requirements(&content)),
                Err(e) => {
                    report.record_error(format!("Failed to parse requirements.txt: {}", e))
                }
            }
        }

        let pyproject = repo_root.join("pyproject.toml");
        if pyproject.exists() {
            report.detected = true;
            report.package_files.push("pyproject.toml".to_string());

            match std::fs::read_to_string(&pyproject)
                .map_err(ParseError::from)
                .and_then(|content| Self::parse_pyproject(&content))
            {
                Ok((main, dev)) => {
                    report.packages.extend(main);
                    report.dev_packages.extend(dev);
                }
                Err(e) => report.record_error(format!("Failed to parse pyproject.toml: {}", e)),
            }
        }

        let pipfile = repo_root.join("Pipfile");
        if pipfile.exists() {
            report.detected = true;
            report.package_files.push("Pipfile".to_string());

            match std::fs::read_to_string(&pipfile)
                .map_err(ParseError::from)
                .and_then(|content| Self::parse_pipfile(&content))
            {
                Ok((main, dev)) => {
                    report.packages.extend(main);
                    report.dev_packages.extend(dev);
                }
                Err(e) => report.record_error(format!("Failed to parse Pipfile: {}", e)),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dependency::UNKNOWN_VERSION;
    use std::fs;

    fn scan_fixture(files: &[(&str, &str)]) -> EcosystemReport {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        PythonScanner::new().scan(tmp.path())
    }

    #[test]
    fn test_requirements_txt() {
        let report = scan_fixture(&[(
            "requirements.txt",
            "requests==2.31.0\n# a comment\n\n-r other.txt\nflask>=2.0\n",
        )]);

        assert!(report.detected);
        assert_eq!(report.packages.len(), 2);

        let requests = &report.packages["requests"];
        assert_eq!(requests.version, "2.31.0");
        assert_eq!(requests.constraint, "==2.31.0");

        assert_eq!(report.packages["flask"].version, "2.0");
    }

    #[test]
    fn test_pyproject_toml() {
        let report = scan_fixture(&[(
            "pyproject.toml",
            r#"
            [project]
            dependencies = ["httpx>=0.27", "pydantic==2.7.1"]

            [project.optional-dependencies]
            test = ["pytest>=8.0"]
            lint = ["ruff"]

            [tool.poetry.dependencies]
            python = "^3.11"
            rich = "^13.7"
            typer = { version = "0.12.3", extras = ["all"] }
            "#,
        )]);

        assert_eq!(report.packages.len(), 4);
        assert_eq!(report.packages["httpx"].version, "0.27");
        assert_eq!(report.packages["rich"].version, "13.7");
        assert_eq!(report.packages["typer"].version, "0.12.3");
        assert!(!report.packages.contains_key("python"));

        assert_eq!(report.dev_packages.len(), 2);
        assert_eq!(report.dev_packages["pytest"].source, "pyproject.toml[test]");
        assert_eq!(report.dev_packages["ruff"].version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_pipfile() {
        let report = scan_fixture(&[(
            "Pipfile",
            r#"
            [packages]
            requests = "*"
            django = ">=4.2"

            [dev-packages]
            pytest = { version = "==8.2.0" }
            "#,
        )]);

        assert_eq!(report.packages.len(), 2);
        assert_eq!(report.packages["requests"].version, UNKNOWN_VERSION);
        assert_eq!(report.packages["django"].version, "4.2");

        let pytest = &report.dev_packages["pytest"];
        assert_eq!(pytest.version, "8.2.0");
        assert_eq!(pytest.source, "Pipfile[dev]");
    }

    #[test]
    fn test_later_files_overwrite_earlier() {
        let report = scan_fixture(&[
            ("requirements.txt", "requests==2.30.0\n"),
            (
                "Pipfile",
                "[packages]\nrequests = \"==2.31.0\"\n",
            ),
        ]);

        assert_eq!(report.packages["requests"].version, "2.31.0");
        assert_eq!(report.packages["requests"].source, "Pipfile");
        assert_eq!(
            report.package_files,
            vec!["requirements.txt", "Pipfile"]
        );
    }

    #[test]
    fn test_malformed_pyproject_keeps_other_results() {
        let report = scan_fixture(&[
            ("requirements.txt", "requests==2.31.0\n"),
            ("pyproject.toml", "not [valid toml"),
        ]);

        assert!(report.detected);
        assert!(report.error.as_deref().unwrap().contains("pyproject.toml"));
        assert_eq!(report.packages.len(), 1);
    }
}
