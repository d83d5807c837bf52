// src/client/mod.rs

//! Build service collaborators
//!
//! The core only talks to the service through two traits:
//! - [`Catalog`]: read-only device and package catalog endpoints
//! - [`BuildTransport`]: single-shot image requests and artifact listings
//!
//! [`ServiceClient`] implements both over HTTP.

mod http;

pub use http::ServiceClient;

use crate::device::{DeviceModel, DeviceTarget};
use crate::error::Result;
use crate::packages::PackageList;
use crate::request::{Artifact, BuildRequest, BuildResponse};
use serde::Deserialize;

/// Shorter device searches are not sent to the catalog
pub const MIN_MODEL_QUERY_LEN: usize = 3;

/// A distribution offered by the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Distro {
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

impl Distro {
    /// Alias when set, name otherwise
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

/// A release of some distribution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub distro: String,
    pub release: String,
}

/// Releases belonging to `distro`, in catalog order
pub fn releases_for<'a>(releases: &'a [Release], distro: &str) -> Vec<&'a Release> {
    releases.iter().filter(|r| r.distro == distro).collect()
}

/// Read-only catalog queries
pub trait Catalog {
    /// Default packages shipped with the image for a device
    fn packages_image(&self, distro: &str, release: &str, device: &DeviceTarget)
        -> Result<PackageList>;

    /// Search device models by name
    fn search_models(&self, query: &str, distro: &str, release: &str) -> Result<Vec<DeviceModel>>;

    fn distros(&self) -> Result<Vec<Distro>>;

    fn releases(&self) -> Result<Vec<Release>>;

    fn network_profiles(&self) -> Result<Vec<String>>;
}

/// Network access for the build controller
///
/// Implementations must not retry; retry policy belongs to the controller.
pub trait BuildTransport {
    /// Send one image request; `Err` only when no response was received
    fn submit(&self, request: &BuildRequest) -> Result<BuildResponse>;

    /// List the files of a finished build
    fn fetch_artifact_listing(&self, base_url: &str) -> Result<Vec<Artifact>>;
}

impl<T: BuildTransport + ?Sized> BuildTransport for &T {
    fn submit(&self, request: &BuildRequest) -> Result<BuildResponse> {
        (**self).submit(request)
    }

    fn fetch_artifact_listing(&self, base_url: &str) -> Result<Vec<Artifact>> {
        (**self).fetch_artifact_listing(base_url)
    }
}
