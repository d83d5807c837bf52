// src/config.rs
//! Configuration file parsing
//!
//! Supports a TOML file with the following sections:
//! - `server` - Base URL of the build service
//! - `[defaults]` - Preselected distro, release, network profile, flavor
//! - `[polling]` - Poll and retry delays, HTTP timeout
//! - `[flavors]` - Named package overlays, `name = "pkg -pkg ..."`
//!
//! The default location is `$XDG_CONFIG_HOME/fwbuild/config.toml`. A
//! missing file yields the built-in defaults.

use crate::build::PollPolicy;
use crate::error::{Error, Result};
use crate::flavor::FlavorTable;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default build service URL
pub const DEFAULT_SERVER: &str = "http://localhost:5000";

/// TOML configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Build service base URL
    #[serde(default = "default_server")]
    pub server: String,

    /// Preselected choices
    #[serde(default)]
    pub defaults: DefaultsSection,

    /// Timing
    #[serde(default)]
    pub polling: PollingSection,

    /// Available flavors
    #[serde(default)]
    pub flavors: FlavorTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            defaults: DefaultsSection::default(),
            polling: PollingSection::default(),
            flavors: FlavorTable::default(),
        }
    }
}

/// Preselected choices, overridable on the command line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsSection {
    pub distro: Option<String>,
    pub release: Option<String>,
    /// Sent verbatim; empty means none
    #[serde(default)]
    pub network_profile: String,
    pub flavor: Option<String>,
}

/// Timing configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSection {
    /// Seconds between polls while a job is queued or building
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds before resubmitting to an overloaded service
    #[serde(default = "default_overload_retry")]
    pub overload_retry_secs: u64,

    /// Per-request HTTP timeout
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            overload_retry_secs: default_overload_retry(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl PollingSection {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            overload_retry: Duration::from_secs(self.overload_retry_secs),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_overload_retry() -> u64 {
    30
}

fn default_http_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            Error::ConfigError(msg) => Error::ConfigError(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to built-in defaults
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::load(path)
            }
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load an explicit path when given, the default location otherwise
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::ConfigError("server must not be empty".to_string()));
        }
        if self.polling.poll_interval_secs == 0 {
            return Err(Error::ConfigError(
                "polling.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.polling.overload_retry_secs == 0 {
            return Err(Error::ConfigError(
                "polling.overload_retry_secs must be at least 1".to_string(),
            ));
        }
        if let Some(flavor) = &self.defaults.flavor {
            self.flavors.get_flavor_overlay(flavor).map_err(|_| {
                Error::ConfigError(format!("defaults.flavor '{}' is not defined in [flavors]", flavor))
            })?;
        }
        Ok(())
    }
}

/// Default config file location
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fwbuild").join("config.toml"))
}
