//! Package registry clients for license lookups
//!
//! One client per ecosystem's public registry (PyPI, Packagist, pkg.go.dev).
//! The license resolver dispatches by ecosystem and converts any error into
//! a degraded `Unknown` record; clients themselves only report what the
//! registry said.

pub mod golang;
pub mod packagist;
pub mod pypi;

use async_trait::async_trait;

use crate::application::errors::ApiError;
use crate::domain::dependency::Ecosystem;
use crate::domain::license::LicenseRecord;

pub use golang::GoPkgClient;
pub use packagist::PackagistClient;
pub use pypi::PypiClient;

/// Trait for querying an ecosystem's registry for a package's license.
#[async_trait]
pub trait LicenseRegistryClient: Send + Sync {
    /// The ecosystem this registry serves.
    fn ecosystem(&self) -> Ecosystem;

    /// Fetch license metadata for a package.
    ///
    /// An `Ok` record may still be `Unknown` (the registry had no usable
    /// license data); `Err` means the lookup itself failed and the caller
    /// should degrade.
    async fn fetch_license(&self, name: &str) -> Result<LicenseRecord, ApiError>;
}
