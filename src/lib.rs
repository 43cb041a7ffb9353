//! Repolens - dependency analysis core for repository portfolio reports
//!
//! This crate analyzes a cloned repository's declared dependencies across
//! three ecosystems (PHP/Composer, Python/pip-family, Go modules), resolves
//! known vulnerabilities against the OSV advisory database (with GHSA
//! fallback), attaches license metadata from the public package registries,
//! and produces the summary counts downstream reporting depends on.
//!
//! # Modules
//!
//! - [`config`] — Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] — Core domain models, entities, and value objects
//! - [`application`] — Analysis services and error types
//! - [`infrastructure`] — Manifest parsers, API clients, and registry lookups
//! - [`logging`] — Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! repolens/
//! ├── domain/           # Pure business logic
//! │   ├── dependency/   # Dependency records and per-ecosystem reports
//! │   ├── vulnerability/# Severity taxonomy and normalized advisories
//! │   └── license/      # License records and text cleaning
//! ├── application/      # Resolvers and the per-repository aggregator
//! ├── infrastructure/   # External integrations
//! │   ├── parsers/      # composer.json, requirements.txt, go.mod, ...
//! │   ├── api_clients/  # OSV and GHSA clients
//! │   └── registries/   # PyPI, Packagist, pkg.go.dev license lookups
//! └── config/           # Configuration management
//! ```
//!
//! # Configuration
//!
//! Load configuration from files and environment:
//!
//! ```rust,ignore
//! use repolens::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `REPOLENS__` prefix with double underscore
//! separators:
//!
//! ```bash
//! REPOLENS__APIS__OSV__BASE_URL=https://api.osv.dev
//! REPOLENS__ANALYSIS__BATCH_CHUNK_SIZE=100
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use repolens::{Config, LanguageInfo, RepositoryAnalysisService};
//! use repolens::domain::dependency::Ecosystem;
//!
//! let service = RepositoryAnalysisService::from_config(&Config::load()?)?;
//! let languages = LanguageInfo::from_ecosystems([Ecosystem::Php, Ecosystem::Python]);
//! let analysis = service.analyze(repo_root, &languages).await;
//! println!("{} direct dependencies", analysis.summary.total_dependencies);
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use application::analysis::{RepositoryAnalysis, RepositoryAnalysisService};
pub use config::Config;
pub use domain::dependency::LanguageInfo;
pub use logging::init_tracing;
