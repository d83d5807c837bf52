// src/build/mod.rs

//! Build request lifecycle
//!
//! - [`state`]: job states and the pure response transition function
//! - [`schedule`]: cancellable follow-up tasks and clocks
//! - [`controller`]: the controller tying transport, sink and timing together

pub mod controller;
pub mod schedule;
pub mod state;

pub use controller::{run_to_completion, BuildRequestController};
pub use schedule::{CancelToken, Clock, SystemClock, TaskHandle};
pub use state::{
    transition, transport_failure, Action, BuildArtifacts, BuildJobState, PollPolicy, ReadyImage,
    TaskKind, Transition, DEFAULT_OVERLOAD_RETRY, DEFAULT_POLL_INTERVAL,
};
