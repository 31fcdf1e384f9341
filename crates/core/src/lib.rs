//! Core types for duolog
//!
//! This crate defines the vocabulary shared by every other duolog crate:
//! - Error: the single error enum and `Result` alias
//! - WorkerId / Role / WorkerState: thread identity and role state machine
//! - LogEvent / LogRecord: what the core reports to its logging collaborator
//! - SequenceCounter: strictly increasing sequence numbers for log records

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod sequence;
pub mod types;

pub use error::{Error, Result};
pub use event::{LogEvent, LogRecord};
pub use sequence::SequenceCounter;
pub use types::{Role, WorkerId, WorkerState};
