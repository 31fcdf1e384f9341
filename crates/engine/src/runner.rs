//! Role runner
//!
//! Both worker threads execute [`run_worker`]. Each claims a role from the
//! registry, then runs the producer or observer loop and drives its part of
//! teardown.
//!
//! ## Producer
//!
//! ```text
//! 1. Read one line (blocking)
//! 2. Empty line or end of input: seal the store, release the writer,
//!    set the termination latch, log Exiting
//! 3. Otherwise: prepend under the store lock, log UpdatedHead, repeat
//! ```
//!
//! ## Observer
//!
//! ```text
//! 1. Wait for a head change (notify) or sleep the interval (poll)
//! 2. Log FirstEntry for every distinct head seen
//! 3. Once the latch is set: final head check, retire the registry,
//!    reclaim and tear down the store, log Exiting
//! ```
//!
//! The producer releases its store handle *before* setting the latch, so by
//! the time the observer sees the latch it holds the only reference and the
//! teardown is a move of sole ownership, not a convention.

use crate::config::{CoordinatorConfig, WatchMode};
use crate::input::{LinePolicy, LineSource};
use crate::journal::{Journal, LogSink};
use duolog_concurrency::{
    Completion, EntryHandle, LogStore, Observation, RoleRegistry, StoreWriter, Teardown,
    TerminationLatch,
};
use duolog_core::{Error, LogEvent, Result, Role, WorkerId, WorkerState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop request raised when one worker hits a fatal error.
///
/// The producer checks it before every read. It is never raised by the
/// normal sentinel path.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    raised: AtomicBool,
}

impl ShutdownSignal {
    /// Create a lowered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Check if the signal was raised
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// State owned by the coordinator and shared by both workers.
///
/// The log store is deliberately not in here: each worker receives its own
/// `Arc` so the observer can reclaim sole ownership at teardown.
pub(crate) struct Shared {
    pub(crate) config: CoordinatorConfig,
    pub(crate) registry: RoleRegistry,
    pub(crate) latch: TerminationLatch,
    pub(crate) journal: Journal,
    pub(crate) shutdown: ShutdownSignal,
    source: Mutex<Option<Box<dyn LineSource>>>,
}

impl Shared {
    pub(crate) fn new(
        config: CoordinatorConfig,
        source: Box<dyn LineSource>,
        sink: Box<dyn LogSink>,
    ) -> Self {
        Shared {
            config,
            registry: RoleRegistry::new(),
            latch: TerminationLatch::new(),
            journal: Journal::new(sink),
            shutdown: ShutdownSignal::new(),
            source: Mutex::new(Some(source)),
        }
    }

    fn take_source(&self) -> Result<Box<dyn LineSource>> {
        self.source.lock().take().ok_or_else(|| {
            Error::ProtocolViolation("input source claimed by more than one producer".to_string())
        })
    }
}

/// What a worker did before terminating.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Worker identity
    pub worker: WorkerId,
    /// Role the worker claimed
    pub role: Role,
    /// Final state (always `Terminated` for a returned report)
    pub state: WorkerState,
    /// Entries prepended (producer only)
    pub entries_written: usize,
    /// Store contents released at teardown (observer only)
    pub teardown: Option<Teardown>,
}

/// Raises the shutdown signal unless disarmed; covers both `?` returns and
/// panics.
struct FailureGuard<'a> {
    shutdown: &'a ShutdownSignal,
    armed: bool,
}

impl<'a> FailureGuard<'a> {
    fn new(shutdown: &'a ShutdownSignal) -> Self {
        FailureGuard {
            shutdown,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FailureGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shutdown.raise();
        }
    }
}

/// Producer-side ownership of the writer and the latch.
///
/// Dropping the session without `finish` (error or panic) still seals the
/// store and completes the latch as `Aborted`, in that order.
struct ProducerSession<'a> {
    writer: Option<StoreWriter>,
    latch: &'a TerminationLatch,
}

impl<'a> ProducerSession<'a> {
    fn new(writer: StoreWriter, latch: &'a TerminationLatch) -> Self {
        ProducerSession {
            writer: Some(writer),
            latch,
        }
    }

    fn prepend_logged(&self, text: String, id: WorkerId, journal: &Journal) -> Result<()> {
        let writer = self.writer.as_ref().ok_or(Error::StoreSealed)?;
        writer.prepend_with(text, |_| journal.record(id, LogEvent::UpdatedHead).map(drop))?;
        Ok(())
    }

    fn finish(mut self) {
        if let Some(writer) = self.writer.take() {
            writer.close();
        }
        self.latch.complete(Completion::Finished);
    }
}

impl Drop for ProducerSession<'_> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.close();
        }
        if self.latch.complete(Completion::Aborted) {
            tracing::warn!("producer stopped without reaching the sentinel");
        }
    }
}

fn advance(id: WorkerId, state: &mut WorkerState, next: WorkerState) -> Result<()> {
    if !state.can_advance_to(next) {
        return Err(Error::ProtocolViolation(format!(
            "worker {} cannot move from {:?} to {:?}",
            id, state, next
        )));
    }
    tracing::trace!(worker = %id, from = ?state, to = ?next, "worker state change");
    *state = next;
    Ok(())
}

/// Entry routine shared by both worker threads
pub(crate) fn run_worker(
    id: WorkerId,
    shared: Arc<Shared>,
    store: Arc<LogStore>,
) -> Result<WorkerReport> {
    let guard = FailureGuard::new(&shared.shutdown);
    let mut state = WorkerState::Unclaimed;

    let claim = shared.registry.claim_role(id);
    advance(id, &mut state, WorkerState::claimed(claim.role()))?;
    tracing::info!(worker = %id, role = %claim.role(), "role claimed");

    let mut report = WorkerReport {
        worker: id,
        role: claim.role(),
        state,
        entries_written: 0,
        teardown: None,
    };

    match claim.role() {
        Role::Producer => {
            report.entries_written = run_producer(id, &shared, store, claim.allocated())?;
        }
        Role::Observer => {
            report.teardown = Some(run_observer(id, &shared, store)?);
        }
    }

    advance(id, &mut state, WorkerState::Terminated)?;
    shared.journal.record(id, LogEvent::Exiting)?;
    report.state = state;

    guard.disarm();
    Ok(report)
}

fn run_producer(
    id: WorkerId,
    shared: &Shared,
    store: Arc<LogStore>,
    allocated: bool,
) -> Result<usize> {
    // The session must exist before anything can fail, so the observer is
    // always released.
    let session = ProducerSession::new(StoreWriter::new(store), &shared.latch);

    if allocated {
        shared.journal.record(id, LogEvent::Allocate)?;
    }

    let mut source = shared.take_source()?;
    let policy = shared.config.line_policy();
    source.limit_line_len(policy.max_len());
    let mut written = 0;

    loop {
        if shared.shutdown.is_raised() {
            return Err(Error::PeerFailed { worker: id });
        }

        let line = match source.read_line()? {
            Some(line) => line,
            None => {
                tracing::info!(worker = %id, "input closed without a sentinel line");
                break;
            }
        };
        if LinePolicy::is_sentinel(&line) {
            break;
        }

        let text = policy.admit(line)?;
        session.prepend_logged(text, id, &shared.journal)?;
        written += 1;
    }

    session.finish();
    tracing::info!(worker = %id, entries = written, "producer finished reading input");
    Ok(written)
}

fn report_head(
    id: WorkerId,
    journal: &Journal,
    last: &mut Option<EntryHandle>,
    observation: Observation,
) -> Result<()> {
    if !observation.changed {
        return Ok(());
    }
    if let Some(head) = &observation.head {
        journal.record(id, LogEvent::first_entry(head.text()))?;
    }
    *last = observation.head;
    Ok(())
}

fn run_observer(id: WorkerId, shared: &Shared, store: Arc<LogStore>) -> Result<Teardown> {
    let interval = shared.config.poll_interval();
    let mut last: Option<EntryHandle> = None;

    let completion = loop {
        let observation = match shared.config.watch_mode {
            WatchMode::Notify => store.wait_for_change(last.as_ref(), interval),
            WatchMode::Poll => {
                shared.latch.wait_timeout(interval);
                store.observe(last.as_ref())
            }
        };
        let sealed = observation.sealed;
        report_head(id, &shared.journal, &mut last, observation)?;

        // The writer seals just before the latch is set.
        if sealed {
            break shared.latch.wait();
        }
    };

    if completion == Completion::Aborted {
        tracing::warn!(worker = %id, "producer aborted; tearing down early");
    }

    // No lost final value: the store is sealed, so this head is the last one.
    let observation = store.observe(last.as_ref());
    report_head(id, &shared.journal, &mut last, observation)?;
    drop(last);

    shared.registry.retire(id)?;
    shared.journal.record(id, LogEvent::DeallocateRegistry)?;

    let teardown = LogStore::reclaim(store)?.teardown();
    shared.journal.record(
        id,
        LogEvent::DeallocateStore {
            entries: teardown.len(),
        },
    )?;

    Ok(teardown)
}
