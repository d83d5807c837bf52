// src/commands/build.rs
//! Package preview and image build commands

use super::Context;
use crate::cli::SelectionArgs;
use anyhow::{Context as _, Result};
use fwbuild::packages::format_package_text;
use fwbuild::{
    run_to_completion, BuildJobState, BuildRequestController, BuildSink, CliSink, DeviceTarget,
    Error, Session, SpinnerSink, SystemClock,
};
use std::io::IsTerminal;
use tracing::{info, warn};

/// Resolve the command line selection into a session with packages loaded
fn prepare_session(ctx: &Context, selection: SelectionArgs, network_profile: String) -> Result<Session> {
    let device: DeviceTarget = selection
        .device
        .parse()
        .with_context(|| format!("Invalid device '{}'", selection.device))?;
    let distro = ctx.distro(selection.distro)?;
    let release = ctx.release(selection.release)?;
    let flavor = selection.flavor.or_else(|| ctx.config.defaults.flavor.clone());

    info!("{}", device.info_line());
    let mut session = Session::new(distro, release, device)
        .with_network_profile(network_profile)
        .with_flavor(flavor);

    match selection.packages_file {
        Some(path) => session.load_user_edits(&path)?,
        None => session
            .load_base_packages(&ctx.client)
            .context("Failed to fetch the image's default packages")?,
    }

    Ok(session)
}

/// Print the effective package list, one per line
pub fn cmd_packages(ctx: &Context, selection: SelectionArgs) -> Result<()> {
    let session = prepare_session(ctx, selection, String::new())?;
    let packages = session.effective_packages(&ctx.config.flavors)?;

    if packages.is_empty() {
        println!("(image defaults)");
    } else {
        println!("{}", format_package_text(&packages));
    }
    Ok(())
}

/// Submit a build request and wait for the outcome
pub fn cmd_build(
    ctx: &Context,
    selection: SelectionArgs,
    network_profile: Option<String>,
) -> Result<()> {
    let network_profile =
        network_profile.unwrap_or_else(|| ctx.config.defaults.network_profile.clone());
    let session = prepare_session(ctx, selection, network_profile)?;
    let request = session.build_request(&ctx.config.flavors)?;

    let sink: Box<dyn BuildSink> = if std::io::stdout().is_terminal() {
        Box::new(SpinnerSink::new())
    } else {
        Box::new(CliSink::new())
    };
    let mut controller =
        BuildRequestController::with_policy(&ctx.client, sink, ctx.config.polling.policy());

    let token = controller.cancel_token();
    ctrlc::set_handler(move || token.cancel()).context("Failed to install Ctrl-C handler")?;

    match run_to_completion(&mut controller, request, &SystemClock) {
        Ok(BuildJobState::Ready(_)) => Ok(()),
        Ok(BuildJobState::Failed { message, .. }) => Err(Error::BuildRejected(message).into()),
        Ok(state) => anyhow::bail!("Build did not complete: {}", state),
        Err(Error::Cancelled) => {
            warn!("Build request cancelled");
            anyhow::bail!("Cancelled")
        }
        Err(e) => Err(e.into()),
    }
}
