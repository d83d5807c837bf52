// src/flavor/mod.rs
//! Flavor overlays
//!
//! A flavor is a named preset of package additions and removals layered on
//! top of a device's default package set. Overlays are written as a single
//! whitespace separated string, e.g. `"lime-full -dnsmasq -odhcpd"`.

use crate::error::{Error, Result};
use crate::packages::{is_removal, removal_target, PackageList};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Package additions and removals for one flavor
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct FlavorOverlay {
    entries: PackageList,
}

impl FlavorOverlay {
    /// Create an overlay from raw entries
    pub fn new(entries: PackageList) -> Self {
        Self { entries }
    }

    /// Parse the whitespace separated form
    pub fn parse(s: &str) -> Result<Self> {
        let entries: PackageList = s.split_whitespace().map(str::to_string).collect();
        if let Some(bad) = entries.iter().find(|e| removal_target(e) == Some("")) {
            return Err(Error::ParseError(format!(
                "Flavor entry '{}' is missing a package name",
                bad
            )));
        }
        Ok(Self { entries })
    }

    /// Raw entries, removal prefixes included
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Packages this flavor adds
    pub fn additions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !is_removal(e))
            .map(String::as_str)
    }

    /// Packages this flavor removes (prefix stripped)
    pub fn removals(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| removal_target(e))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for FlavorOverlay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FlavorOverlay {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl fmt::Display for FlavorOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entries.join(" "))
    }
}

/// Named flavors available to the user
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct FlavorTable {
    flavors: BTreeMap<String, FlavorOverlay>,
}

impl FlavorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a flavor
    pub fn insert(&mut self, name: impl Into<String>, overlay: FlavorOverlay) {
        self.flavors.insert(name.into(), overlay);
    }

    /// Look up the raw overlay for a flavor key
    pub fn get_flavor_overlay(&self, key: &str) -> Result<&FlavorOverlay> {
        self.flavors
            .get(key)
            .ok_or_else(|| Error::NotFoundError(format!("Unknown flavor '{}'", key)))
    }

    /// Resolve an optional selection into overlay entries
    ///
    /// No selection means an empty overlay.
    pub fn overlay_for(&self, selection: Option<&str>) -> Result<PackageList> {
        match selection {
            Some(key) => Ok(self.get_flavor_overlay(key)?.entries().to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Flavor names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flavors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlavorOverlay)> {
        self.flavors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.flavors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flavors.is_empty()
    }
}
