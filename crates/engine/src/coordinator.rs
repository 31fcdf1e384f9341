//! Thread coordinator
//!
//! Spawns exactly two worker threads running the same routine, joins both,
//! and reports either the run summary or the first fatal error.
//!
//! # Example
//!
//! ```ignore
//! use duolog_engine::{Coordinator, MemorySink, ScriptedSource};
//!
//! let report = Coordinator::builder()
//!     .source(ScriptedSource::new(["ls", "pwd", ""]))
//!     .sink(MemorySink::new())
//!     .run()?;
//!
//! assert_eq!(report.entries, vec!["pwd", "ls"]);
//! ```

use crate::config::{CoordinatorConfig, OversizePolicy, WatchMode};
use crate::input::{LineSource, StdinSource};
use crate::journal::{LogSink, TracingSink};
use crate::runner::{run_worker, Shared, WorkerReport};
use duolog_concurrency::{Completion, LogStore};
use duolog_core::{Error, Result, WorkerId};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Number of worker threads; the protocol is defined for exactly two.
pub const WORKER_COUNT: u64 = 2;

/// Shortest time a failed run waits for the other worker to wind down.
pub const MIN_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Worker that claimed the producer role
    pub producer: WorkerId,
    /// One report per worker, in spawn order
    pub workers: Vec<WorkerReport>,
    /// Store contents at teardown, head first
    pub entries: Vec<String>,
    /// How the producer finished
    pub completion: Completion,
    /// Total log records emitted
    pub events_logged: u64,
}

impl RunReport {
    /// Report of the observer worker
    pub fn observer(&self) -> Option<&WorkerReport> {
        self.workers.iter().find(|w| !w.role.is_producer())
    }

    /// Check if every worker reached `Terminated`
    pub fn all_terminated(&self) -> bool {
        self.workers.iter().all(|w| w.state.is_terminated())
    }
}

/// Runs one producer/observer session.
pub struct Coordinator {
    config: CoordinatorConfig,
    source: Box<dyn LineSource>,
    sink: Box<dyn LogSink>,
}

impl Coordinator {
    /// Create a builder
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Active configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Spawn both workers, collect their outcomes, and report
    ///
    /// Workers report as they finish, not in spawn order. Once one fails,
    /// its peer gets one poll interval to wind down; a peer still blocked
    /// after that (for example in a read) is left behind, so a failure is
    /// never hidden behind a blocked join.
    ///
    /// # Returns
    /// - `Ok(RunReport)` once both workers reach `Terminated`
    /// - The first primary fatal error otherwise; a `PeerFailed` error is only
    ///   returned if no worker reported anything more specific
    pub fn run(self) -> Result<RunReport> {
        let Coordinator {
            config,
            source,
            sink,
        } = self;
        let grace = config.poll_interval().max(MIN_SHUTDOWN_GRACE);
        let shared = Arc::new(Shared::new(config, source, sink));
        let (tx, rx) = mpsc::channel();

        // The coordinator keeps no store handle: the second spawn moves the
        // last one, so only the workers can ever own it.
        let store = Arc::new(LogStore::new());
        tracing::info!("create first thread");
        let first = spawn_worker(
            WorkerId::new(1),
            Arc::clone(&shared),
            Arc::clone(&store),
            tx.clone(),
        )?;
        tracing::info!("create second thread");
        let second = spawn_worker(WorkerId::new(WORKER_COUNT), Arc::clone(&shared), store, tx)?;
        let mut handles = vec![first, second];

        let mut workers = Vec::with_capacity(WORKER_COUNT as usize);
        let mut failure: Option<Error> = None;
        let mut deadline: Option<Instant> = None;

        tracing::info!("wait for workers to exit");
        for _ in 0..WORKER_COUNT {
            let received = match deadline {
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            };
            let (id, outcome) = match received {
                Ok(message) => message,
                Err(_) => {
                    tracing::warn!("peer worker did not exit after a failure; abandoning it");
                    break;
                }
            };

            if let Some(at) = handles.iter().position(|(worker, _)| *worker == id) {
                let (_, handle) = handles.swap_remove(at);
                // The outcome is already in hand; a panic was reported as one
                let _ = handle.join();
            }

            match outcome {
                Ok(report) => {
                    tracing::info!(worker = %id, role = %report.role, "worker exited");
                    workers.push(report);
                }
                Err(e) => {
                    tracing::error!(worker = %id, error = %e, "worker failed");
                    shared.shutdown.raise();
                    deadline.get_or_insert_with(|| Instant::now() + grace);
                    failure = Some(match failure {
                        Some(prev) if !prev.is_secondary() || e.is_secondary() => prev,
                        _ => e,
                    });
                }
            }
        }

        if let Some(e) = failure {
            // Flushing must not mask the failure, and a worker left behind
            // may still be using the sink
            if handles.is_empty() {
                if let Err(flush) = shared.journal.flush() {
                    tracing::warn!(error = %flush, "flush failed after worker failure");
                }
            }
            return Err(e);
        }
        shared.journal.flush()?;

        workers.sort_by_key(|w| w.worker);
        let producer = shared.registry.producer().ok_or_else(|| {
            Error::ProtocolViolation("run finished without a producer".to_string())
        })?;
        let entries = workers
            .iter()
            .find_map(|w| w.teardown.as_ref())
            .map(|t| t.entries.clone())
            .unwrap_or_default();

        Ok(RunReport {
            producer,
            workers,
            entries,
            completion: shared.latch.completion().unwrap_or(Completion::Aborted),
            events_logged: shared.journal.events_logged(),
        })
    }
}

type Outcome = (WorkerId, Result<WorkerReport>);

/// Sends a worker's outcome to the coordinator exactly once.
///
/// If the worker unwinds before sending, the drop reports the panic.
struct ExitNotice {
    id: WorkerId,
    tx: Option<Sender<Outcome>>,
}

impl ExitNotice {
    fn send(mut self, outcome: Result<WorkerReport>) {
        if let Some(tx) = self.tx.take() {
            // The coordinator may have stopped listening
            let _ = tx.send((self.id, outcome));
        }
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((self.id, Err(Error::WorkerPanicked { worker: self.id })));
        }
    }
}

fn spawn_worker(
    id: WorkerId,
    shared: Arc<Shared>,
    store: Arc<LogStore>,
    tx: Sender<Outcome>,
) -> Result<(WorkerId, JoinHandle<()>)> {
    let handle = thread::Builder::new()
        .name(format!("duolog-worker-{}", id))
        .spawn(move || {
            let notice = ExitNotice { id, tx: Some(tx) };
            notice.send(run_worker(id, shared, store));
        })?;
    Ok((id, handle))
}

/// Builder for a [`Coordinator`].
///
/// # Example
///
/// ```ignore
/// let coordinator = Coordinator::builder()
///     .config(CoordinatorConfig::load("duolog.toml")?)
///     .poll_interval(Duration::from_millis(100))
///     .stdin()
///     .build()?;
/// ```
#[derive(Default)]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    source: Option<Box<dyn LineSource>>,
    sink: Option<Box<dyn LogSink>>,
}

impl CoordinatorBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Observer interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Observer watch mode
    pub fn watch_mode(mut self, mode: WatchMode) -> Self {
        self.config.watch_mode = mode;
        self
    }

    /// Maximum characters kept per line
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.config.max_line_len = len;
        self
    }

    /// Policy for oversize lines
    pub fn oversize(mut self, policy: OversizePolicy) -> Self {
        self.config.oversize = policy;
        self
    }

    /// Input collaborator
    pub fn source(mut self, source: impl LineSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Read input from standard input
    pub fn stdin(self) -> Self {
        self.source(StdinSource::new())
    }

    /// Logging collaborator (defaults to [`TracingSink`])
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Coordinator> {
        self.config.validate()?;
        let source = self
            .source
            .ok_or_else(|| Error::Config("no input source configured".to_string()))?;
        Ok(Coordinator {
            config: self.config,
            source,
            sink: self.sink.unwrap_or_else(|| Box::new(TracingSink)),
        })
    }

    /// Build and run
    pub fn run(self) -> Result<RunReport> {
        self.build()?.run()
    }
}
