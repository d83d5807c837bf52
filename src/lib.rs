// src/lib.rs

//! fwbuild - firmware image build client
//!
//! Requests custom firmware images from a remote build service: pick a
//! device, distribution and release, adjust the package list, submit the
//! request and poll until the image is ready or the request fails.
//!
//! # Architecture
//!
//! - Package lists: layered install/remove reconciliation (`-name` removes)
//! - Flavors: named overlays of additions and removals
//! - Build controller: explicit job-state machine over repeated submissions
//! - Collaborators: catalog, transport and status sink behind traits

pub mod build;
pub mod client;
pub mod config;
pub mod device;
mod error;
pub mod flavor;
pub mod packages;
pub mod progress;
pub mod request;
pub mod session;

pub use build::{
    run_to_completion, BuildArtifacts, BuildJobState, BuildRequestController, CancelToken, Clock,
    PollPolicy, ReadyImage, SystemClock, TaskHandle, TaskKind,
};
pub use client::{BuildTransport, Catalog, Distro, Release, ServiceClient};
pub use config::Config;
pub use device::{DeviceModel, DeviceParseError, DeviceTarget};
pub use error::{Error, Result};
pub use flavor::{FlavorOverlay, FlavorTable};
pub use packages::{apply_flavor_and_edits, reconcile, PackageList, PackageName};
pub use progress::{BuildSink, CliSink, LogSink, SilentSink, SpinnerSink};
pub use request::{Artifact, BuildRequest, BuildResponse};
pub use session::Session;
