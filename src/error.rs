// src/error.rs

//! Error types for the build client

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    /// Local I/O failure (reading an edit file, the config file, ...)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Malformed input: device strings, JSON bodies, TOML
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Network failure or unexpected HTTP status from a catalog endpoint
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Failed to construct a client or other runtime resource
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Requested item does not exist (unknown flavor, missing file)
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// The build service rejected the request
    #[error("Build request rejected: {0}")]
    BuildRejected(String),

    /// A build request is already outstanding on this controller
    #[error("A build request is already in progress")]
    Busy,

    /// The controller was cancelled and cannot be reused
    #[error("Build request was cancelled")]
    Cancelled,
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::DownloadError(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
