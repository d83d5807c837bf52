// src/progress.rs

//! Build status reporting
//!
//! The core never renders anything. It reports state changes through a
//! [`BuildSink`]:
//! - `CliSink`: human readable output on stdout/stderr
//! - `SpinnerSink`: live status on a terminal spinner using indicatif
//! - `LogSink`: forwards to tracing
//! - `SilentSink`: no-op for scripted use and tests

use crate::build::ReadyImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tracing::{error, info};

/// Receiver of build status updates
pub trait BuildSink {
    /// Transient status (queued, building, overloaded, ...)
    fn on_info(&mut self, message: &str);

    /// Terminal failure
    fn on_error(&mut self, message: &str);

    /// Build finished; called at most once per request
    fn on_ready(&mut self, image: &ReadyImage);
}

/// Silent sink (no-op)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl BuildSink for SilentSink {
    fn on_info(&mut self, _message: &str) {}

    fn on_error(&mut self, _message: &str) {}

    fn on_ready(&mut self, _image: &ReadyImage) {}
}

/// Logging sink
///
/// Useful for non-interactive environments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl BuildSink for LogSink {
    fn on_info(&mut self, message: &str) {
        info!("{}", message);
    }

    fn on_error(&mut self, message: &str) {
        error!("{}", message);
    }

    fn on_ready(&mut self, image: &ReadyImage) {
        if let Some(firmware) = image.artifacts.firmware_url() {
            info!("Firmware: {}", firmware);
        }
        for file in &image.files {
            info!("File: {}", file.url);
        }
    }
}

/// Terminal sink writing status lines and download links
///
/// Status and links go to `out`, failures to `err`.
pub struct CliSink<W: Write = std::io::Stdout, E: Write = std::io::Stderr> {
    out: W,
    err: E,
    last_info: Option<String>,
}

impl CliSink {
    pub fn new() -> Self {
        Self::with_writers(std::io::stdout(), std::io::stderr())
    }
}

impl Default for CliSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> CliSink<W> {
    /// Write status to `out`, failures to stderr
    pub fn with_writer(out: W) -> Self {
        Self::with_writers(out, std::io::stderr())
    }
}

impl<W: Write, E: Write> CliSink<W, E> {
    pub fn with_writers(out: W, err: E) -> Self {
        Self {
            out,
            err,
            last_info: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Both writers, status first
    pub fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }

    // Write errors are ignored
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write, E: Write> BuildSink for CliSink<W, E> {
    fn on_info(&mut self, message: &str) {
        // Polls repeat the same status every few seconds
        if self.last_info.as_deref() == Some(message) {
            return;
        }
        self.line(&format!("==> {message}"));
        self.last_info = Some(message.to_string());
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.err, "error: {message}");
    }

    fn on_ready(&mut self, image: &ReadyImage) {
        let artifacts = &image.artifacts;
        if let Some(firmware) = artifacts.firmware_url() {
            self.line(&format!("Firmware:  {firmware}"));
        }
        if let Some(log) = artifacts.build_log_url() {
            self.line(&format!("Build log: {log}"));
        }
        if let Some(signature) = artifacts.signature_url() {
            self.line(&format!("Signature: {signature}"));
        }
        if !image.files.is_empty() {
            self.line("Files:");
            for file in &image.files {
                self.line(&format!("  {}  {}", file.name, file.url));
            }
        }
    }
}

/// Terminal spinner showing the latest status, links printed when ready
pub struct SpinnerSink {
    spinner: ProgressBar,
    links: CliSink,
}

impl SpinnerSink {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(spinner: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner,
            links: CliSink::new(),
        }
    }
}

impl Default for SpinnerSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSink for SpinnerSink {
    fn on_info(&mut self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.spinner.abandon_with_message(format!("error: {message}"));
    }

    fn on_ready(&mut self, image: &ReadyImage) {
        self.spinner.finish_and_clear();
        self.links.on_ready(image);
    }
}

impl<S: BuildSink + ?Sized> BuildSink for Box<S> {
    fn on_info(&mut self, message: &str) {
        (**self).on_info(message);
    }

    fn on_error(&mut self, message: &str) {
        (**self).on_error(message);
    }

    fn on_ready(&mut self, image: &ReadyImage) {
        (**self).on_ready(image);
    }
}
