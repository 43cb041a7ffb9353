//! Dependency domain: ecosystems, scopes, records, and per-ecosystem reports

pub mod entities;
pub mod value_objects;

pub use entities::{flatten_dependencies, DependencyRecord, EcosystemReport, PackageDetail};
pub use value_objects::{DependencyScope, Ecosystem, LanguageInfo, UNKNOWN_VERSION};
