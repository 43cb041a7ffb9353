//! Packagist JSON API license lookups

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::domain::dependency::Ecosystem;
use crate::domain::license::{LicenseRecord, LicenseSource};

use super::LicenseRegistryClient;

/// Client for `https://packagist.org/packages/{vendor}/{name}.json`.
///
/// Takes the license array of the most recently listed version; multiple
/// licenses join with `" / "`.
pub struct PackagistClient {
    client: Client,
    base_url: String,
}

impl PackagistClient {
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

    fn record_from_package(package: &Value) -> LicenseRecord {
        let latest_version = package
            .get("versions")
            .and_then(|v| v.as_object())
            .and_then(|versions| versions.values().next());

        let licenses: Vec<String> = latest_version
            .and_then(|v| v.get("license"))
            .and_then(|l| l.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|l| l.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if licenses.is_empty() {
            return LicenseRecord::unknown(
                "No license info found in Packagist data",
                LicenseSource::PackagistNotFound,
            );
        }

        LicenseRecord::new(
            licenses.join(" / "),
            format!("{:?}", licenses),
            LicenseSource::Packagist,
        )
    }
}

#[async_trait]
impl LicenseRegistryClient for PackagistClient {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    async fn fetch_license(&self, name: &str) -> Result<LicenseRecord, ApiError> {
        let url = format!("{}/packages/{}.json", self.base_url, name);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        let data: Value = response.json().await?;
        let package = data.get("package").cloned().unwrap_or(Value::Null);

        let record = Self::record_from_package(&package);
        tracing::debug!(package = name, license = %record.license, source = %record.source, "Packagist license resolved");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_license() {
        let package = json!({
            "versions": {"2.1.0": {"license": ["MIT"]}}
        });
        let record = PackagistClient::record_from_package(&package);
        assert_eq!(record.license, "MIT");
        assert_eq!(record.source, LicenseSource::Packagist);
    }

    #[test]
    fn test_multiple_licenses_joined() {
        let package = json!({
            "versions": {"1.0.0": {"license": ["MIT", "GPL-2.0"]}}
        });
        let record = PackagistClient::record_from_package(&package);
        assert_eq!(record.license, "MIT / GPL-2.0");
    }

    #[test]
    fn test_missing_license_array() {
        let package = json!({"versions": {"1.0.0": {}}});
        let record = PackagistClient::record_from_package(&package);
        assert_eq!(record.license, "Unknown");
        assert_eq!(record.source, LicenseSource::PackagistNotFound);
    }

    #[tokio::test]
    async fn test_fetch_license_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/packages/guzzlehttp/guzzle.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "package": {"versions": {"7.8.1": {"license": ["MIT"]}}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = PackagistClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let record = client.fetch_license("guzzlehttp/guzzle").await.unwrap();
        assert_eq!(record.license, "MIT");
    }
}
