//! Per-repository analysis aggregation

pub mod models;
pub mod service;

pub use models::{RepositoryAnalysis, RepositoryDependencySummary};
pub use service::RepositoryAnalysisService;
