// src/request.rs

//! Wire types for the image request endpoint

use crate::device::DeviceTarget;
use crate::packages::PackageList;
use serde::{Deserialize, Serialize};

/// Body of `POST /image-request`
///
/// `packages` is left out entirely when empty, which asks the service for
/// the image defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub distro: String,
    pub version: String,
    pub target: String,
    pub subtarget: String,
    pub board: String,
    pub network_profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: PackageList,
}

impl BuildRequest {
    pub fn new(
        distro: impl Into<String>,
        release: impl Into<String>,
        device: &DeviceTarget,
        network_profile: impl Into<String>,
        packages: PackageList,
    ) -> Self {
        Self {
            distro: distro.into(),
            version: release.into(),
            target: device.target.clone(),
            subtarget: device.subtarget.clone(),
            board: device.profile.clone(),
            network_profile: network_profile.into(),
            packages,
        }
    }

    pub fn device(&self) -> DeviceTarget {
        DeviceTarget::new(&self.target, &self.subtarget, &self.board)
    }
}

/// Raw status and JSON body of one submission
///
/// Empty or non-JSON bodies arrive as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl BuildResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

/// One entry of a finished build's artifact listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub url: String,
}

impl Artifact {
    /// Build an entry from the listing base URL and a file name
    pub fn from_listing(base_url: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            url: format!("{base_url}{name}"),
            name,
        }
    }
}
