// src/client/http.rs

//! HTTP client for the build service
//!
//! Wraps a blocking reqwest client. Catalog queries treat any non-success
//! status as an error; image requests hand the raw status back to the
//! build controller, which owns all retry decisions.

use super::{BuildTransport, Catalog, Distro, Release, MIN_MODEL_QUERY_LEN};
use crate::device::{DeviceModel, DeviceTarget};
use crate::error::{Error, Result};
use crate::packages::{reconcile, PackageList};
use crate::request::{Artifact, BuildRequest, BuildResponse};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PackagesImage {
    #[serde(default)]
    packages: PackageList,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
}

/// Client for one build service instance
pub struct ServiceClient {
    client: Client,
    base: Url,
}

impl ServiceClient {
    /// Create a client for the service at `server` with the default timeout
    pub fn new(server: &str) -> Result<Self> {
        Self::with_timeout(server, HTTP_TIMEOUT)
    }

    pub fn with_timeout(server: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(server)
            .map_err(|e| Error::ConfigError(format!("Invalid server URL '{}': {}", server, e)))?;
        // Endpoint paths are joined relative to the base
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// Base URL all endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::ParseError(format!("Invalid endpoint '{}': {}", path, e)))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json()
            .map_err(|e| Error::ParseError(format!("Invalid JSON from {}: {}", url, e)))
    }
}

impl Catalog for ServiceClient {
    fn packages_image(
        &self,
        distro: &str,
        release: &str,
        device: &DeviceTarget,
    ) -> Result<PackageList> {
        let mut url = self.endpoint("api/packages_image")?;
        url.query_pairs_mut()
            .append_pair("distro", distro)
            .append_pair("release", release)
            .append_pair("target", &device.target)
            .append_pair("subtarget", &device.subtarget)
            .append_pair("profile", &device.profile);

        let image: PackagesImage = self.get_json(url)?;
        // Image defaults may themselves carry removal entries
        let packages = reconcile(&image.packages);
        info!("Image for {} ships {} packages", device, packages.len());
        Ok(packages)
    }

    fn search_models(&self, query: &str, distro: &str, release: &str) -> Result<Vec<DeviceModel>> {
        let query = query.trim();
        if query.chars().count() < MIN_MODEL_QUERY_LEN {
            debug!("Model search '{}' too short, skipping", query);
            return Ok(Vec::new());
        }

        let mut url = self.endpoint("api/models")?;
        url.query_pairs_mut()
            .append_pair("model_search", query)
            .append_pair("distro", distro)
            .append_pair("release", release);
        self.get_json(url)
    }

    fn distros(&self) -> Result<Vec<Distro>> {
        self.get_json(self.endpoint("api/distros")?)
    }

    fn releases(&self) -> Result<Vec<Release>> {
        self.get_json(self.endpoint("api/releases")?)
    }

    fn network_profiles(&self) -> Result<Vec<String>> {
        self.get_json(self.endpoint("api/network_profiles")?)
    }
}

impl BuildTransport for ServiceClient {
    fn submit(&self, request: &BuildRequest) -> Result<BuildResponse> {
        let url = self.endpoint("image-request")?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| Error::DownloadError(format!("Failed to read response: {e}")))?;

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!("Non-JSON body with status {}: {}", status, e);
                serde_json::Value::Null
            })
        };

        Ok(BuildResponse::new(status, body))
    }

    fn fetch_artifact_listing(&self, base_url: &str) -> Result<Vec<Artifact>> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::ParseError(format!("Invalid listing URL '{}': {}", base_url, e)))?;
        let entries: Vec<ListingEntry> = self.get_json(url)?;

        Ok(entries
            .into_iter()
            .map(|entry| Artifact::from_listing(base_url, entry.name))
            .collect())
    }
}
