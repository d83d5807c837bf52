// src/build/state.rs

//! Build job states and the response transition function
//!
//! The build service reports job progress through HTTP status codes on
//! repeated submissions of the same request:
//!
//! | Status | State | Next action |
//! |--------|-------|-------------|
//! | 400 | `Failed` | stop, report the server's message |
//! | 500 | `ServerError` | stop, report a generic message |
//! | 503 | `Overloaded` | resubmit after the overload delay |
//! | 201 | `Setup`, or `Queued` when a queue position is present | poll again |
//! | 206 | `Building` | poll again |
//! | 200 | `Ready` | fetch the artifact listing |
//!
//! Anything else is treated as a server error. [`transition`] is pure: no
//! network, no timers.

use crate::request::{Artifact, BuildResponse};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default delay between polls while a job is in progress
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default delay before resubmitting to an overloaded service
pub const DEFAULT_OVERLOAD_RETRY: Duration = Duration::from_secs(30);

const SERVER_ERROR_MESSAGE: &str = "internal server error, please try again later";

/// Timing for follow-up requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between polls for Setup, Queued and Building
    pub poll_interval: Duration,
    /// Wait before resubmitting after a 503
    pub overload_retry: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            overload_retry: DEFAULT_OVERLOAD_RETRY,
        }
    }
}

/// Links returned for a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// Sysupgrade image, absent when the build produced none
    pub sysupgrade: Option<String>,
    /// Base URL of the artifact listing
    pub files: String,
    /// Build log reported by the server
    pub log: Option<String>,
}

impl BuildArtifacts {
    pub fn firmware_url(&self) -> Option<&str> {
        self.sysupgrade.as_deref()
    }

    /// Build log next to the firmware, falling back to the reported log
    pub fn build_log_url(&self) -> Option<String> {
        match &self.sysupgrade {
            Some(image) => Some(format!("{image}.log")),
            None => self.log.clone(),
        }
    }

    pub fn signature_url(&self) -> Option<String> {
        self.sysupgrade.as_ref().map(|image| format!("{image}.sig"))
    }
}

/// A finished build together with its artifact listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyImage {
    pub artifacts: BuildArtifacts,
    pub files: Vec<Artifact>,
}

impl ReadyImage {
    pub fn new(artifacts: BuildArtifacts, files: Vec<Artifact>) -> Self {
        Self { artifacts, files }
    }
}

/// Lifecycle of a build job as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildJobState {
    /// Nothing submitted yet
    NotStarted,
    /// Waiting behind `position` other jobs
    Queued { position: u32 },
    /// The imagebuilder for this target is being provisioned
    Setup,
    /// The image is being built
    Building,
    /// Build finished
    Ready(BuildArtifacts),
    /// Request rejected by the service
    Failed {
        message: String,
        log_url: Option<String>,
    },
    /// Internal error, unexpected status or unreachable service
    ServerError,
    /// Service asked us to come back later
    Overloaded,
}

impl BuildJobState {
    /// Returns true once no further requests will be made
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ready(_) | Self::Failed { .. } | Self::ServerError
        )
    }

    /// Status line shown to the user for this state
    pub fn message(&self) -> String {
        match self {
            Self::NotStarted => "request not submitted".to_string(),
            Self::Queued { position } => {
                format!("please wait, you are in queue position {position}")
            }
            Self::Setup => "imagebuilder not ready, please wait".to_string(),
            Self::Building => "building image".to_string(),
            Self::Ready(_) => "image created".to_string(),
            Self::Failed { message, log_url } => match log_url {
                Some(log) => format!("{message} (build log: {log})"),
                None => message.clone(),
            },
            Self::ServerError => SERVER_ERROR_MESSAGE.to_string(),
            Self::Overloaded => "please wait, server overloaded".to_string(),
        }
    }
}

impl fmt::Display for BuildJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Queued { position } => write!(f, "queued ({position})"),
            Self::Setup => write!(f, "setup"),
            Self::Building => write!(f, "building"),
            Self::Ready(_) => write!(f, "ready"),
            Self::Failed { .. } => write!(f, "failed"),
            Self::ServerError => write!(f, "server error"),
            Self::Overloaded => write!(f, "overloaded"),
        }
    }
}

/// Why a follow-up request is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Job in progress, check again
    Poll,
    /// Service overloaded, submit again
    Resubmit,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => write!(f, "poll"),
            Self::Resubmit => write!(f, "resubmit"),
        }
    }
}

/// What the controller does after a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the same request again after `delay`
    Schedule { kind: TaskKind, delay: Duration },
    /// Build finished, fetch the listing and report it
    Complete(BuildArtifacts),
    /// Terminal failure with the message to surface
    Abort { message: String },
    /// Nothing to do (response arrived after a terminal state)
    Stop,
}

/// Result of interpreting one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: BuildJobState,
    pub action: Action,
}

impl Transition {
    fn new(state: BuildJobState, action: Action) -> Self {
        Self { state, action }
    }

    fn abort(state: BuildJobState) -> Self {
        let message = state.message();
        Self::new(state, Action::Abort { message })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RejectedBody {
    error: Option<String>,
    log: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueuedBody {
    queue: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadyBody {
    sysupgrade: Option<String>,
    files: Option<String>,
    log: Option<String>,
}

fn parse_body<T: DeserializeOwned + Default>(response: &BuildResponse) -> T {
    if response.body.is_null() {
        return T::default();
    }
    serde_json::from_value(response.body.clone()).unwrap_or_else(|e| {
        debug!("Ignoring unexpected body for status {}: {}", response.status, e);
        T::default()
    })
}

/// Interpret a response given the current state
pub fn transition(state: &BuildJobState, response: &BuildResponse, policy: &PollPolicy) -> Transition {
    if state.is_terminal() {
        debug!("Response {} after terminal state {}, ignoring", response.status, state);
        return Transition::new(state.clone(), Action::Stop);
    }

    let poll = Action::Schedule {
        kind: TaskKind::Poll,
        delay: policy.poll_interval,
    };

    match response.status {
        400 => {
            let body: RejectedBody = parse_body(response);
            Transition::abort(BuildJobState::Failed {
                message: body
                    .error
                    .unwrap_or_else(|| "request rejected by the build service".to_string()),
                log_url: body.log,
            })
        }
        500 => {
            let body: RejectedBody = parse_body(response);
            if let Some(detail) = body.error {
                debug!("Server error detail: {} (log: {:?})", detail, body.log);
            }
            Transition::abort(BuildJobState::ServerError)
        }
        503 => Transition::new(
            BuildJobState::Overloaded,
            Action::Schedule {
                kind: TaskKind::Resubmit,
                delay: policy.overload_retry,
            },
        ),
        201 => {
            let body: QueuedBody = parse_body(response);
            let state = match body.queue {
                Some(position) => BuildJobState::Queued { position },
                None => BuildJobState::Setup,
            };
            Transition::new(state, poll)
        }
        206 => Transition::new(BuildJobState::Building, poll),
        200 => {
            let body: ReadyBody = parse_body(response);
            match body.files {
                Some(files) => {
                    let artifacts = BuildArtifacts {
                        sysupgrade: body.sysupgrade,
                        files,
                        log: body.log,
                    };
                    Transition::new(
                        BuildJobState::Ready(artifacts.clone()),
                        Action::Complete(artifacts),
                    )
                }
                None => Transition::new(
                    BuildJobState::ServerError,
                    Action::Abort {
                        message: "build finished but the server sent no file listing".to_string(),
                    },
                ),
            }
        }
        other => Transition::new(
            BuildJobState::ServerError,
            Action::Abort {
                message: format!("unexpected response status {other} from the build service"),
            },
        ),
    }
}

/// Transition for a request that never got a response
pub fn transport_failure(reason: &str) -> Transition {
    Transition::new(
        BuildJobState::ServerError,
        Action::Abort {
            message: format!("build service unreachable: {reason}"),
        },
    )
}
