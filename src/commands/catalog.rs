// src/commands/catalog.rs
//! Catalog browsing commands

use super::Context;
use anyhow::{Context as _, Result};
use fwbuild::client::{releases_for, MIN_MODEL_QUERY_LEN};
use fwbuild::Catalog;
use tracing::info;

/// List distributions
pub fn cmd_distros(ctx: &Context) -> Result<()> {
    info!("Listing distributions");
    let distros = ctx.client.distros().context("Failed to fetch distributions")?;

    if distros.is_empty() {
        println!("No distributions available");
    } else {
        for distro in distros {
            println!("{} ({})", distro.name, distro.display_name());
        }
    }
    Ok(())
}

/// List releases of a distribution
pub fn cmd_releases(ctx: &Context, distro: Option<String>) -> Result<()> {
    let distro = ctx.distro(distro)?;
    info!("Listing releases for {}", distro);
    let releases = ctx.client.releases().context("Failed to fetch releases")?;

    let matching = releases_for(&releases, &distro);
    if matching.is_empty() {
        println!("No releases for {}", distro);
    } else {
        for release in matching {
            println!("{}", release.release);
        }
    }
    Ok(())
}

/// Search device models
pub fn cmd_models(
    ctx: &Context,
    query: &str,
    distro: Option<String>,
    release: Option<String>,
) -> Result<()> {
    if query.trim().chars().count() < MIN_MODEL_QUERY_LEN {
        anyhow::bail!("Search query must be at least {} characters", MIN_MODEL_QUERY_LEN);
    }
    let distro = ctx.distro(distro)?;
    let release = ctx.release(release)?;

    let models = ctx
        .client
        .search_models(query, &distro, &release)
        .with_context(|| format!("Failed to search models matching '{}'", query))?;

    if models.is_empty() {
        println!("Not found");
    } else {
        for model in models {
            println!("{}  {}", model.model, model.device_target());
        }
    }
    Ok(())
}

/// List network profiles
pub fn cmd_network_profiles(ctx: &Context) -> Result<()> {
    let profiles = ctx
        .client
        .network_profiles()
        .context("Failed to fetch network profiles")?;

    for profile in profiles {
        println!("{}", profile);
    }
    Ok(())
}

/// List configured flavors
pub fn cmd_flavors(ctx: &Context) -> Result<()> {
    let flavors = &ctx.config.flavors;
    if flavors.is_empty() {
        println!("No flavors configured");
        return Ok(());
    }

    let default = ctx.config.defaults.flavor.as_deref();
    for (name, overlay) in flavors.iter() {
        let mark = if Some(name) == default { "*" } else { " " };
        println!("{} {}: {}", mark, name, overlay);
    }
    Ok(())
}
