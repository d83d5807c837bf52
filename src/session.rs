// src/session.rs

//! Per-session selection state
//!
//! Holds everything the user picked (distro, release, device, network
//! profile, flavor) plus the package layers loaded for that pick. The
//! reconciler and the build request are both computed from a `Session`
//! instead of ambient globals.

use crate::client::Catalog;
use crate::device::DeviceTarget;
use crate::error::{Error, Result};
use crate::flavor::FlavorTable;
use crate::packages::{apply_flavor_and_edits, parse_package_text, PackageList};
use crate::request::BuildRequest;
use std::path::Path;
use tracing::{debug, info};

/// The user's current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub distro: String,
    pub release: String,
    pub device: DeviceTarget,
    pub network_profile: String,
    pub flavor: Option<String>,
    base_packages: PackageList,
    user_edits: Option<PackageList>,
}

impl Session {
    pub fn new(distro: impl Into<String>, release: impl Into<String>, device: DeviceTarget) -> Self {
        Self {
            distro: distro.into(),
            release: release.into(),
            device,
            network_profile: String::new(),
            flavor: None,
            base_packages: Vec::new(),
            user_edits: None,
        }
    }

    pub fn with_network_profile(mut self, profile: impl Into<String>) -> Self {
        self.network_profile = profile.into();
        self
    }

    pub fn with_flavor(mut self, flavor: Option<String>) -> Self {
        self.flavor = flavor;
        self
    }

    /// Fetch the image defaults for the selected device
    pub fn load_base_packages<C: Catalog + ?Sized>(&mut self, catalog: &C) -> Result<()> {
        self.base_packages = catalog.packages_image(&self.distro, &self.release, &self.device)?;
        debug!(
            "Loaded {} default packages for {}",
            self.base_packages.len(),
            self.device
        );
        Ok(())
    }

    pub fn set_base_packages(&mut self, packages: PackageList) {
        self.base_packages = packages;
    }

    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    /// Make a hand-edited list authoritative
    pub fn set_user_edits(&mut self, packages: PackageList) {
        self.user_edits = Some(packages);
    }

    /// Read hand edits from a file, one package per line
    pub fn load_user_edits(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read package list {}: {}", path.display(), e))
        })?;
        let packages = parse_package_text(&text);
        info!("Using {} packages from {}", packages.len(), path.display());
        self.user_edits = Some(packages);
        Ok(())
    }

    /// Hand edits, `None` until the user edits the list
    pub fn user_edits(&self) -> Option<&[String]> {
        self.user_edits.as_deref()
    }

    pub fn has_user_edits(&self) -> bool {
        self.user_edits.is_some()
    }

    /// The package list a build request would carry
    pub fn effective_packages(&self, flavors: &FlavorTable) -> Result<PackageList> {
        let overlay = flavors.overlay_for(self.flavor.as_deref())?;
        Ok(apply_flavor_and_edits(
            &self.base_packages,
            &overlay,
            self.user_edits(),
        ))
    }

    /// Snapshot the selection into a build request
    pub fn build_request(&self, flavors: &FlavorTable) -> Result<BuildRequest> {
        Ok(BuildRequest::new(
            &self.distro,
            &self.release,
            &self.device,
            &self.network_profile,
            self.effective_packages(flavors)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::FlavorOverlay;
    use std::io::Write;

    fn session() -> Session {
        let mut session = Session::new("lime", "17.06", DeviceTarget::new("ath79", "generic", "c7"));
        session.set_base_packages(vec!["a".into(), "b".into()]);
        session
    }

    fn flavors() -> FlavorTable {
        let mut table = FlavorTable::new();
        table.insert("mesh", FlavorOverlay::parse("-b c").unwrap());
        table
    }

    #[test]
    fn test_effective_without_flavor() {
        assert_eq!(session().effective_packages(&flavors()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_effective_with_flavor() {
        let session = session().with_flavor(Some("mesh".into()));
        assert_eq!(session.effective_packages(&flavors()).unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_unknown_flavor() {
        let session = session().with_flavor(Some("nope".into()));
        assert!(matches!(
            session.effective_packages(&flavors()),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_user_edits_bypass_flavor() {
        let mut session = session().with_flavor(Some("mesh".into()));
        session.set_user_edits(vec!["b".into(), "x".into()]);
        assert!(session.has_user_edits());
        assert_eq!(session.effective_packages(&flavors()).unwrap(), vec!["b", "x"]);
    }

    #[test]
    fn test_load_user_edits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "luci\n\n  htop  \n").unwrap();

        let mut session = session();
        session.load_user_edits(file.path()).unwrap();
        assert_eq!(session.user_edits().unwrap(), &["luci", "htop"]);
    }

    #[test]
    fn test_build_request() {
        let session = session()
            .with_flavor(Some("mesh".into()))
            .with_network_profile("libremesh.org/default");
        let request = session.build_request(&flavors()).unwrap();

        assert_eq!(request.distro, "lime");
        assert_eq!(request.version, "17.06");
        assert_eq!(request.board, "c7");
        assert_eq!(request.network_profile, "libremesh.org/default");
        assert_eq!(request.packages, vec!["a", "c"]);
    }
}
