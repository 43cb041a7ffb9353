//! Go module metadata lookups
//!
//! pkg.go.dev's metadata API does not expose license data, so Go license
//! resolution consistently reports `Unknown`; the call is still made so the
//! provenance distinguishes "registry answered without data" from a failed
//! lookup.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::domain::dependency::Ecosystem;
use crate::domain::license::{LicenseRecord, LicenseSource};

use super::LicenseRegistryClient;

/// Client for `https://api.pkg.go.dev`.
pub struct GoPkgClient {
    client: Client,
    base_url: String,
}

impl GoPkgClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LicenseRegistryClient for GoPkgClient {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }

    async fn fetch_license(&self, name: &str) -> Result<LicenseRecord, ApiError> {
        let url = format!("{}/v1/symbol/{}@latest", self.base_url, name);

        let response = self.client.get(&url).send().await?;

        let raw = if response.status().is_success() {
            "pkg.go.dev metadata does not include license data"
        } else {
            "pkg.go.dev API did not return data"
        };

        Ok(LicenseRecord::unknown(raw, LicenseSource::GolangNoData))
    }
}
