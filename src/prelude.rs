//! Convenient imports for duolog.
//!
//! ```ignore
//! use duolog::prelude::*;
//!
//! let report = Coordinator::builder().stdin().run()?;
//! ```

// Main entry point
pub use crate::{Coordinator, CoordinatorBuilder, CoordinatorConfig, RunReport};

// Error handling
pub use crate::{Error, Result};

// Collaborators
pub use crate::{LineSource, LogSink, MemorySink, ScriptedSource, StdinSource, TracingSink};

// Core types
pub use crate::{Completion, LogEvent, LogRecord, OversizePolicy, Role, WatchMode, WorkerId};
