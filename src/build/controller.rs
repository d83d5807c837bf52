// src/build/controller.rs

//! Build request controller
//!
//! Owns exactly one build request from submission to a terminal outcome.
//! Every follow-up request re-sends the identical payload; the service
//! recognises it as the same job. Follow-ups are strictly sequential: a new
//! task is issued only after the previous response has been processed, and
//! only the most recently issued task is accepted by [`fire`].
//!
//! [`fire`]: BuildRequestController::fire

use super::schedule::{CancelToken, Clock, TaskHandle};
use super::state::{
    transition, transport_failure, Action, BuildArtifacts, BuildJobState, PollPolicy, ReadyImage,
    TaskKind, Transition,
};
use crate::client::BuildTransport;
use crate::error::{Error, Result};
use crate::progress::BuildSink;
use crate::request::BuildRequest;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Drives a single build request through the job lifecycle
pub struct BuildRequestController<T: BuildTransport, S: BuildSink> {
    transport: T,
    sink: S,
    policy: PollPolicy,
    state: BuildJobState,
    request: Option<BuildRequest>,
    /// Id of the only task `fire` will accept
    pending: Option<u64>,
    next_task_id: u64,
    requests_sent: u32,
    token: CancelToken,
}

impl<T: BuildTransport, S: BuildSink> BuildRequestController<T, S> {
    /// Create a controller with default poll timing
    pub fn new(transport: T, sink: S) -> Self {
        Self::with_policy(transport, sink, PollPolicy::default())
    }

    pub fn with_policy(transport: T, sink: S, policy: PollPolicy) -> Self {
        Self {
            transport,
            sink,
            policy,
            state: BuildJobState::NotStarted,
            request: None,
            pending: None,
            next_task_id: 1,
            requests_sent: 0,
            token: CancelToken::new(),
        }
    }

    pub fn state(&self) -> &BuildJobState {
        &self.state
    }

    pub fn request(&self) -> Option<&BuildRequest> {
        self.request.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Number of submissions sent so far, polls included
    pub fn requests_sent(&self) -> u32 {
        self.requests_sent
    }

    /// Token shared with every issued task; cancelling it stops the controller
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true while a follow-up request is scheduled
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit a new request and process the first response
    ///
    /// Returns the follow-up task to wait for, or `None` once the request
    /// reached a terminal outcome. Fails with [`Error::Busy`] while a
    /// previous request is still being polled.
    pub fn submit(&mut self, request: BuildRequest) -> Result<Option<TaskHandle>> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.pending.is_some() {
            return Err(Error::Busy);
        }

        info!(
            "Requesting {} {} image for {} ({} packages)",
            request.distro,
            request.version,
            request.device(),
            request.packages.len()
        );
        self.request = Some(request);
        self.state = BuildJobState::NotStarted;
        Ok(self.dispatch())
    }

    /// Run a scheduled follow-up request
    ///
    /// Cancelled or superseded tasks are ignored and return `None`.
    pub fn fire(&mut self, task: &TaskHandle) -> Result<Option<TaskHandle>> {
        if task.is_cancelled() || self.is_cancelled() {
            debug!("Ignoring {} task {}: controller cancelled", task.kind(), task.id());
            return Ok(None);
        }
        if self.pending != Some(task.id()) {
            debug!("Ignoring stale {} task {}", task.kind(), task.id());
            return Ok(None);
        }

        self.pending = None;
        Ok(self.dispatch())
    }

    /// Cancel the request and invalidate any scheduled follow-up
    ///
    /// A cancelled controller never reports to its sink again.
    pub fn cancel(&mut self) {
        self.token.cancel();
        match self.pending.take() {
            Some(id) => info!("Cancelled build request, dropped pending task {}", id),
            None => debug!("Cancelled build request with no pending task"),
        }
    }

    fn dispatch(&mut self) -> Option<TaskHandle> {
        let request = self.request.as_ref()?;

        self.requests_sent += 1;
        debug!("Sending image request (attempt {})", self.requests_sent);
        let outcome = self.transport.submit(request);

        if self.is_cancelled() {
            debug!("Discarding response received after cancellation");
            return None;
        }

        let next = match outcome {
            Ok(response) => {
                debug!("Build service answered {}", response.status);
                transition(&self.state, &response, &self.policy)
            }
            Err(e) => {
                warn!("Image request failed: {}", e);
                transport_failure(&e.to_string())
            }
        };
        self.apply(next)
    }

    fn apply(&mut self, next: Transition) -> Option<TaskHandle> {
        if next.state != self.state {
            debug!("Build state {} -> {}", self.state, next.state);
        }
        self.state = next.state;

        match next.action {
            Action::Schedule { kind, delay } => {
                self.sink.on_info(&self.state.message());
                Some(self.schedule(kind, delay))
            }
            Action::Complete(artifacts) => {
                self.complete(artifacts);
                None
            }
            Action::Abort { message } => {
                error!("Build request ended: {}", message);
                self.sink.on_error(&message);
                None
            }
            Action::Stop => None,
        }
    }

    fn schedule(&mut self, kind: TaskKind, delay: Duration) -> TaskHandle {
        let id = self.next_task_id;
        self.next_task_id += 1;
        self.pending = Some(id);
        debug!("Scheduled {} task {} in {:?}", kind, id, delay);
        TaskHandle::new(id, kind, delay, self.token.clone())
    }

    fn complete(&mut self, artifacts: BuildArtifacts) {
        let files = match self.transport.fetch_artifact_listing(&artifacts.files) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not fetch artifact listing from {}: {}", artifacts.files, e);
                Vec::new()
            }
        };

        if self.is_cancelled() {
            debug!("Build finished after cancellation, not reporting");
            return;
        }

        info!("Image ready ({} files)", files.len());
        self.sink.on_info(&self.state.message());
        self.sink.on_ready(&ReadyImage::new(artifacts, files));
    }
}

/// Submit `request` and wait out every follow-up until a terminal state
///
/// Returns the terminal state, or [`Error::Cancelled`] if the controller
/// was cancelled while waiting.
pub fn run_to_completion<T, S, C>(
    controller: &mut BuildRequestController<T, S>,
    request: BuildRequest,
    clock: &C,
) -> Result<BuildJobState>
where
    T: BuildTransport,
    S: BuildSink,
    C: Clock,
{
    let mut next = controller.submit(request)?;

    while let Some(task) = next {
        if !clock.wait(&task) {
            controller.cancel();
            return Err(Error::Cancelled);
        }
        next = controller.fire(&task)?;
    }

    if controller.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(controller.state().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceTarget;
    use crate::progress::SilentSink;
    use crate::request::{Artifact, BuildResponse};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<BuildResponse>>,
        sent: RefCell<Vec<BuildRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<BuildResponse>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl BuildTransport for Scripted {
        fn submit(&self, request: &BuildRequest) -> Result<BuildResponse> {
            self.sent.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::DownloadError("no scripted response".to_string()))
        }

        fn fetch_artifact_listing(&self, base_url: &str) -> Result<Vec<Artifact>> {
            Ok(vec![Artifact::from_listing(base_url, "image.bin")])
        }
    }

    fn request() -> BuildRequest {
        BuildRequest::new(
            "lime",
            "17.01",
            &DeviceTarget::new("ath79", "generic", "c7"),
            "",
            Vec::new(),
        )
    }

    fn building() -> BuildResponse {
        BuildResponse::new(206, serde_json::Value::Null)
    }

    #[test]
    fn test_submit_while_pending_is_busy() {
        let mut controller = BuildRequestController::new(Scripted::new(vec![building()]), SilentSink);
        let task = controller.submit(request()).unwrap();
        assert!(task.is_some());
        assert!(matches!(controller.submit(request()), Err(Error::Busy)));
    }

    #[test]
    fn test_stale_task_ignored() {
        let transport = Scripted::new(vec![building(), building()]);
        let mut controller = BuildRequestController::new(transport, SilentSink);

        let first = controller.submit(request()).unwrap().unwrap();
        let second = controller.fire(&first).unwrap().unwrap();
        assert_ne!(first.id(), second.id());

        // The first task was consumed; firing it again must not send anything
        assert!(controller.fire(&first).unwrap().is_none());
        assert_eq!(controller.requests_sent(), 2);
        assert!(controller.is_pending());
    }

    #[test]
    fn test_cancel_invalidates_task() {
        let transport = Scripted::new(vec![building(), building()]);
        let mut controller = BuildRequestController::new(transport, SilentSink);

        let task = controller.submit(request()).unwrap().unwrap();
        controller.cancel();

        assert!(task.is_cancelled());
        assert!(controller.fire(&task).unwrap().is_none());
        assert_eq!(controller.transport().sent.borrow().len(), 1);
        assert!(matches!(controller.submit(request()), Err(Error::Cancelled)));
    }

    #[test]
    fn test_transport_failure_stops() {
        let mut controller = BuildRequestController::new(Scripted::new(Vec::new()), SilentSink);
        assert!(controller.submit(request()).unwrap().is_none());
        assert_eq!(controller.state(), &BuildJobState::ServerError);
        assert!(!controller.is_pending());
    }

    #[test]
    fn test_resubmit_after_terminal() {
        let transport = Scripted::new(vec![
            BuildResponse::new(500, json!(null)),
            BuildResponse::new(206, json!(null)),
        ]);
        let mut controller = BuildRequestController::new(transport, SilentSink);

        assert!(controller.submit(request()).unwrap().is_none());
        assert_eq!(controller.state(), &BuildJobState::ServerError);

        assert!(controller.submit(request()).unwrap().is_some());
        assert_eq!(controller.state(), &BuildJobState::Building);
    }

    #[test]
    fn test_polls_reuse_payload() {
        let transport = Scripted::new(vec![
            BuildResponse::new(201, json!({"queue": 2})),
            building(),
            BuildResponse::new(200, json!({"files": "http://x/"})),
        ]);
        let mut controller = BuildRequestController::new(transport, SilentSink);

        let mut next = controller.submit(request()).unwrap();
        while let Some(task) = next {
            next = controller.fire(&task).unwrap();
        }

        let sent = controller.transport().sent.borrow();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|r| *r == request()));
        assert!(controller.state().is_terminal());
    }
}
