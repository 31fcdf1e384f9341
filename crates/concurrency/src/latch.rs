//! Termination latch
//!
//! A one-way signal that the producer has stopped emitting input. The latch
//! is set at most once and never unset; later `complete` calls are no-ops.
//! Waiters block on a condition variable instead of polling.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// How the producer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The producer read the sentinel (or end of input) and stopped normally
    Finished,
    /// The producer stopped because of a fatal error or a panic
    Aborted,
}

/// Set-once termination signal.
#[derive(Debug, Default)]
pub struct TerminationLatch {
    state: Mutex<Option<Completion>>,
    signal: Condvar,
}

impl TerminationLatch {
    /// Create an unset latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch
    ///
    /// Returns `true` if this call set it. The first completion wins; an
    /// `Aborted` after `Finished` (or the reverse) does not overwrite it.
    pub fn complete(&self, completion: Completion) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(completion);
        drop(state);
        self.signal.notify_all();
        tracing::debug!(?completion, "termination latch set");
        true
    }

    /// Check if the latch is set
    pub fn is_set(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Completion recorded by the latch, if set
    pub fn completion(&self) -> Option<Completion> {
        *self.state.lock()
    }

    /// Block until the latch is set
    pub fn wait(&self) -> Completion {
        let mut state = self.state.lock();
        loop {
            if let Some(completion) = *state {
                return completion;
            }
            self.signal.wait(&mut state);
        }
    }

    /// Block until the latch is set or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Completion> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(completion) = *state {
                return Some(completion);
            }
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                return *state;
            }
        }
    }
}
