//! Engine layer for duolog
//!
//! Wires the shared resources from `duolog-concurrency` into the two-thread
//! producer/observer protocol:
//! - config: coordinator options, TOML loading
//! - input: the line source read by the producer
//! - journal: sequenced logging collaborator and sinks
//! - runner: the per-thread role state machine
//! - coordinator: spawn, join, report

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod input;
pub mod journal;
mod runner;

pub use config::{CoordinatorConfig, OversizePolicy, WatchMode};
pub use coordinator::{
    Coordinator, CoordinatorBuilder, RunReport, MIN_SHUTDOWN_GRACE, WORKER_COUNT,
};
pub use input::{BufReadSource, LinePolicy, LineSource, ScriptedSource, StdinSource};
pub use journal::{Journal, LogSink, MemorySink, TracingSink};
pub use runner::{ShutdownSignal, WorkerReport};
