//! PyPI JSON API license lookups

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::application::errors::ApiError;
use crate::domain::dependency::Ecosystem;
use crate::domain::license::{clean_license_text, normalize_classifier_name, LicenseRecord, LicenseSource};

use super::LicenseRegistryClient;

/// Client for `https://pypi.org/pypi/{name}/json`.
///
/// Resolution order: the explicit `license` field (cleaned), then
/// `License ::` classifiers (normalized), then the newer
/// `license_expression` field, else `Unknown`.
pub struct PypiClient {
    client: Client,
    base_url: String,
}

impl PypiClient {
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

    fn record_from_info(info: &Value) -> LicenseRecord {
        // 1. Explicit license field, unless it is empty or a non-answer.
        let license_text = info
            .get("license")
            .and_then(|l| l.as_str())
            .unwrap_or("")
            .trim();
        if !license_text.is_empty()
            && !matches!(license_text.to_lowercase().as_str(), "unknown" | "none")
        {
            return LicenseRecord::new(
                clean_license_text(license_text),
                license_text,
                LicenseSource::PypiLicenseField,
            );
        }

        // 2. License classifiers.
        let classifiers = info
            .get("classifiers")
            .and_then(|c| c.as_array())
            .map(|a| a.as_slice())
            .unwrap_or_default();
        for classifier in classifiers.iter().filter_map(|c| c.as_str()) {
            if !classifier.starts_with("License ::") {
                continue;
            }
            let name = classifier.rsplit("::").next().unwrap_or("").trim();
            if name == "Other/Proprietary License" {
                continue;
            }
            return LicenseRecord::new(
                normalize_classifier_name(name),
                classifier,
                LicenseSource::PypiClassifier,
            );
        }

        // 3. Newer license_expression field.
        let expression = info
            .get("license_expression")
            .and_then(|l| l.as_str())
            .unwrap_or("")
            .trim();
        if !expression.is_empty() {
            return LicenseRecord::new(
                expression,
                expression,
                LicenseSource::PypiLicenseExpression,
            );
        }

        LicenseRecord::unknown(
            "No license info found in PyPI data",
            LicenseSource::PypiNotFound,
        )
    }
}

#[async_trait]
impl LicenseRegistryClient for PypiClient {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    async fn fetch_license(&self, name: &str) -> Result<LicenseRecord, ApiError> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        let data: Value = response.json().await?;
        let info = data.get("info").cloned().unwrap_or(Value::Null);

        let record = Self::record_from_info(&info);
        tracing::debug!(package = name, license = %record.license, source = %record.source, "PyPI license resolved");
        Ok(record)
    }
}
