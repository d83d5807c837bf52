// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        // No command provided, show help
        println!("fwbuild v{}", env!("CARGO_PKG_VERSION"));
        println!("Run 'fwbuild --help' for usage information");
        return Ok(());
    };

    let ctx = Context::load(cli.config.as_deref(), cli.server)?;

    match command {
        Commands::Distros => commands::cmd_distros(&ctx),
        Commands::Releases { distro } => commands::cmd_releases(&ctx, distro),
        Commands::Models {
            query,
            distro,
            release,
        } => commands::cmd_models(&ctx, &query, distro, release),
        Commands::NetworkProfiles => commands::cmd_network_profiles(&ctx),
        Commands::Flavors => commands::cmd_flavors(&ctx),
        Commands::Packages { selection } => commands::cmd_packages(&ctx, selection),
        Commands::Build {
            selection,
            network_profile,
        } => commands::cmd_build(&ctx, selection, network_profile),
    }
}
