// src/commands/mod.rs
//! Command handlers for the fwbuild CLI

mod build;
mod catalog;

pub use build::{cmd_build, cmd_packages};
pub use catalog::{cmd_distros, cmd_flavors, cmd_models, cmd_network_profiles, cmd_releases};

use anyhow::{Context as _, Result};
use fwbuild::{Config, ServiceClient};
use std::path::Path;

/// Configuration and service client shared by all handlers
pub struct Context {
    pub config: Config,
    pub client: ServiceClient,
}

impl Context {
    /// Load configuration and connect to the configured (or overridden) server
    pub fn load(config_path: Option<&Path>, server: Option<String>) -> Result<Self> {
        let mut config = Config::load_from(config_path).context("Failed to load configuration")?;
        if let Some(server) = server {
            config.server = server;
        }

        let client = ServiceClient::with_timeout(&config.server, config.polling.http_timeout())
            .with_context(|| format!("Failed to set up client for {}", config.server))?;

        Ok(Self { config, client })
    }

    /// Distro from the command line or the config defaults
    pub fn distro(&self, arg: Option<String>) -> Result<String> {
        arg.or_else(|| self.config.defaults.distro.clone())
            .context("No distribution selected; pass --distro or set defaults.distro")
    }

    /// Release from the command line or the config defaults
    pub fn release(&self, arg: Option<String>) -> Result<String> {
        arg.or_else(|| self.config.defaults.release.clone())
            .context("No release selected; pass --release or set defaults.release")
    }
}
