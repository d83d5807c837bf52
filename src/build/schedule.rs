// src/build/schedule.rs

//! Cancellable scheduled follow-up requests
//!
//! The controller never sleeps itself. It hands out a [`TaskHandle`] for
//! each follow-up request, and whoever drives it waits on a [`Clock`] and
//! fires the handle back. Cancelling the controller's [`CancelToken`]
//! invalidates every handle it issued and wakes any waiting clock.

use super::state::TaskKind;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared cancellation flag with wakeup
///
/// Cloning shares the same flag, so a clone can be moved into a signal
/// handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake all waiters
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`
    ///
    /// Returns true if the token was cancelled before the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
        true
    }
}

/// Handle to one scheduled follow-up request
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    kind: TaskKind,
    delay: Duration,
    token: CancelToken,
}

impl TaskHandle {
    pub(crate) fn new(id: u64, kind: TaskKind, delay: Duration, token: CancelToken) -> Self {
        Self {
            id,
            kind,
            delay,
            token,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Waits out a task's delay
pub trait Clock {
    /// Returns false if the task was cancelled before its delay elapsed
    fn wait(&self, task: &TaskHandle) -> bool;
}

/// Wall-clock waits that wake early on cancellation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wait(&self, task: &TaskHandle) -> bool {
        !task.token().wait_timeout(task.delay())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_wait_times_out() {
        let token = CancelToken::new();
        assert!(!token.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_returns_immediately_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(token.wait_timeout(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_system_clock_cancelled_task() {
        let token = CancelToken::new();
        let task = TaskHandle::new(1, TaskKind::Poll, Duration::from_secs(5), token.clone());
        token.cancel();
        assert!(task.is_cancelled());
        assert!(!SystemClock.wait(&task));
    }

    #[test]
    fn test_system_clock_elapses() {
        let task = TaskHandle::new(
            2,
            TaskKind::Resubmit,
            Duration::from_millis(5),
            CancelToken::new(),
        );
        assert!(SystemClock.wait(&task));
        assert_eq!(task.kind(), TaskKind::Resubmit);
        assert_eq!(task.id(), 2);
    }
}
