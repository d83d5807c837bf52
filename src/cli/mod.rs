// src/cli/mod.rs
//! CLI definitions for fwbuild
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Catalog browsing:
//! - `distros`, `releases`, `models`, `network-profiles`, `flavors`
//!
//! Building:
//! - `packages` - Show the effective package list for a selection
//! - `build` - Submit a build request and wait for the image

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fwbuild")]
#[command(author = "fwbuild Contributors")]
#[command(version)]
#[command(about = "Request custom firmware images from a build service", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/fwbuild/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Build service URL, overrides the configuration file
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Device and package selection shared by `packages` and `build`
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Device as target/subtarget/profile
    #[arg(short, long)]
    pub device: String,

    /// Distribution (default from config)
    #[arg(long)]
    pub distro: Option<String>,

    /// Release (default from config)
    #[arg(short, long)]
    pub release: Option<String>,

    /// Flavor overlay to apply (default from config)
    #[arg(short, long)]
    pub flavor: Option<String>,

    /// Hand-edited package list, one name per line; replaces the computed list
    #[arg(short, long, value_name = "FILE")]
    pub packages_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available distributions
    Distros,

    /// List releases of a distribution
    Releases {
        /// Distribution (default from config)
        #[arg(long)]
        distro: Option<String>,
    },

    /// Search device models
    Models {
        /// Part of the model name (at least 3 characters)
        query: String,

        /// Distribution (default from config)
        #[arg(long)]
        distro: Option<String>,

        /// Release (default from config)
        #[arg(short, long)]
        release: Option<String>,
    },

    /// List network profiles
    NetworkProfiles,

    /// List configured flavors
    Flavors,

    /// Print the effective package list for a device
    Packages {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Request an image build and wait until it is ready
    Build {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Network profile (default from config)
        #[arg(short, long)]
        network_profile: Option<String>,
    },
}
