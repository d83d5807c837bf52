// tests/common/mod.rs

//! Shared fakes for integration tests: scripted transport, recording sink,
//! instant clock and an in-memory catalog.

#![allow(dead_code)]

use fwbuild::{
    Artifact, BuildRequest, BuildResponse, BuildSink, BuildTransport, CancelToken, Catalog, Clock,
    DeviceModel, DeviceTarget, Distro, Error, PackageList, ReadyImage, Release, Result,
    TaskHandle,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted answer: a response or a transport failure
pub enum Reply {
    Respond(u16, Value),
    Fail(&'static str),
}

/// Transport that answers from a script and records every request
///
/// `cancel_on_submit` and `cancel_on_listing` cancel the given token while
/// the matching call is in flight.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    pub sent: RefCell<Vec<BuildRequest>>,
    pub listings: RefCell<Vec<String>>,
    pub listing: Vec<Artifact>,
    pub listing_fails: bool,
    pub cancel_on_submit: RefCell<Option<CancelToken>>,
    pub cancel_on_listing: RefCell<Option<CancelToken>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn with_listing(mut self, listing: Vec<Artifact>) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl BuildTransport for ScriptedTransport {
    fn submit(&self, request: &BuildRequest) -> Result<BuildResponse> {
        self.sent.borrow_mut().push(request.clone());
        if let Some(token) = self.cancel_on_submit.borrow().as_ref() {
            token.cancel();
        }
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Respond(status, body)) => Ok(BuildResponse::new(status, body)),
            Some(Reply::Fail(reason)) => Err(Error::DownloadError(reason.to_string())),
            None => panic!("transport called more often than scripted"),
        }
    }

    fn fetch_artifact_listing(&self, base_url: &str) -> Result<Vec<Artifact>> {
        self.listings.borrow_mut().push(base_url.to_string());
        if let Some(token) = self.cancel_on_listing.borrow().as_ref() {
            token.cancel();
        }
        if self.listing_fails {
            return Err(Error::DownloadError(format!("HTTP 404 from {base_url}")));
        }
        Ok(self.listing.clone())
    }
}

/// Sink that keeps every notification for later assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub infos: Vec<String>,
    pub errors: Vec<String>,
    pub ready: Vec<ReadyImage>,
}

impl BuildSink for RecordingSink {
    fn on_info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn on_ready(&mut self, image: &ReadyImage) {
        self.ready.push(image.clone());
    }
}

/// Clock that never sleeps and records the delays it was asked to wait
///
/// With `cancel_after` set, the nth wait cancels the task's token instead.
#[derive(Default)]
pub struct InstantClock {
    pub waits: RefCell<Vec<Duration>>,
    pub cancel_after: Option<usize>,
    calls: Cell<usize>,
}

impl InstantClock {
    pub fn cancelling_at(n: usize) -> Self {
        Self {
            cancel_after: Some(n),
            ..Default::default()
        }
    }
}

impl Clock for InstantClock {
    fn wait(&self, task: &TaskHandle) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.waits.borrow_mut().push(task.delay());
        if self.cancel_after == Some(self.calls.get()) {
            task.token().cancel();
            return false;
        }
        true
    }
}

/// Catalog backed by fixed data
#[derive(Default)]
pub struct FakeCatalog {
    pub image_packages: PackageList,
    pub models: Vec<DeviceModel>,
}

impl Catalog for FakeCatalog {
    fn packages_image(&self, _distro: &str, _release: &str, _device: &DeviceTarget) -> Result<PackageList> {
        Ok(self.image_packages.clone())
    }

    fn search_models(&self, query: &str, _distro: &str, _release: &str) -> Result<Vec<DeviceModel>> {
        Ok(self
            .models
            .iter()
            .filter(|m| m.model.contains(query))
            .cloned()
            .collect())
    }

    fn distros(&self) -> Result<Vec<Distro>> {
        Ok(Vec::new())
    }

    fn releases(&self) -> Result<Vec<Release>> {
        Ok(Vec::new())
    }

    fn network_profiles(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub fn test_device() -> DeviceTarget {
    DeviceTarget::new("ar71xx", "generic", "tl-wdr3600-v1")
}

pub fn test_request() -> BuildRequest {
    BuildRequest::new(
        "lime",
        "17.06",
        &test_device(),
        "libremesh.org/default",
        vec!["lime-full".to_string(), "-ppp".to_string()],
    )
}
