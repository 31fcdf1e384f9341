//! # duolog
//!
//! Two threads, one shared log.
//!
//! Both worker threads run the same routine. The first to claim the role
//! registry becomes the producer: it reads commands from an input source and
//! prepends each one to a shared log. The other becomes the observer: it
//! reports every new head of the log until the producer finishes, then tears
//! down the registry and the log exactly once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use duolog::prelude::*;
//!
//! let sink = MemorySink::new();
//! let report = Coordinator::builder()
//!     .source(ScriptedSource::new(["ls", "pwd", ""]))
//!     .sink(sink.clone())
//!     .run()?;
//!
//! assert_eq!(report.entries, vec!["pwd", "ls"]);
//! ```
//!
//! ## Layers
//!
//! - `duolog-core` - ids, roles, events, errors
//! - `duolog-concurrency` - role registry, termination latch, log store
//! - `duolog-engine` - configuration, input, journal, coordinator

#![warn(missing_docs)]

pub mod prelude;

// Re-export main entry points
pub use duolog_core::{Error, Result};
pub use duolog_engine::{
    Coordinator, CoordinatorBuilder, CoordinatorConfig, RunReport, MIN_SHUTDOWN_GRACE,
};

// Re-export collaborators
pub use duolog_engine::{
    BufReadSource, LineSource, LogSink, MemorySink, ScriptedSource, StdinSource, TracingSink,
};

// Re-export types
pub use duolog_concurrency::{
    Completion, EntryHandle, LogStore, Observation, RoleRegistry, StoreWriter, Teardown,
    TerminationLatch,
};
pub use duolog_core::{LogEvent, LogRecord, Role, WorkerId, WorkerState};
pub use duolog_engine::{LinePolicy, OversizePolicy, ShutdownSignal, WatchMode, WorkerReport};
