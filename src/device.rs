// src/device.rs

//! Device identification
//!
//! The catalog identifies a buildable device by three components:
//!
//! - **Target**: the SoC family (e.g. `ath79`)
//! - **Subtarget**: a variant within the target (e.g. `generic`)
//! - **Profile**: the board profile passed to the imagebuilder
//!
//! On the wire and on the command line these are joined as
//! `target/subtarget/profile`. The string form is parsed once into a
//! [`DeviceTarget`] and never re-split downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing a `target/subtarget/profile` string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceParseError {
    #[error("Expected target/subtarget/profile, got '{0}'")]
    WrongComponentCount(String),

    #[error("Empty target in '{0}'")]
    EmptyTarget(String),

    #[error("Empty subtarget in '{0}'")]
    EmptySubtarget(String),

    #[error("Empty profile in '{0}'")]
    EmptyProfile(String),
}

/// A device selection resolved to its build coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub target: String,
    pub subtarget: String,
    pub profile: String,
}

impl DeviceTarget {
    /// Create a new device target
    pub fn new(
        target: impl Into<String>,
        subtarget: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            subtarget: subtarget.into(),
            profile: profile.into(),
        }
    }

    /// Parse the composite `target/subtarget/profile` form
    pub fn parse(s: &str) -> Result<Self, DeviceParseError> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [target, subtarget, profile] = parts.as_slice() else {
            return Err(DeviceParseError::WrongComponentCount(s.to_string()));
        };

        if target.is_empty() {
            return Err(DeviceParseError::EmptyTarget(s.to_string()));
        }
        if subtarget.is_empty() {
            return Err(DeviceParseError::EmptySubtarget(s.to_string()));
        }
        if profile.is_empty() {
            return Err(DeviceParseError::EmptyProfile(s.to_string()));
        }

        Ok(Self::new(*target, *subtarget, *profile))
    }

    /// The composite wire form
    pub fn composite(&self) -> String {
        format!("{}/{}/{}", self.target, self.subtarget, self.profile)
    }

    /// Human readable info line shown when a device is selected
    pub fn info_line(&self) -> String {
        format!(
            "Target: {} - Subtarget: {} - Profile: {}",
            self.target, self.subtarget, self.profile
        )
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.target, self.subtarget, self.profile)
    }
}

impl FromStr for DeviceTarget {
    type Err = DeviceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A device model as returned by the catalog search
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceModel {
    /// Marketing name, e.g. "TP-Link Archer C7 v2"
    pub model: String,
    pub target: String,
    pub subtarget: String,
    pub profile: String,
}

impl DeviceModel {
    /// Structured build coordinates for this model
    pub fn device_target(&self) -> DeviceTarget {
        DeviceTarget::new(&self.target, &self.subtarget, &self.profile)
    }
}
