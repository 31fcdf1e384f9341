//! Error types for duolog
//!
//! Every failure in the producer/observer protocol is fatal to the worker
//! that hits it. Errors travel up to the thread boundary, where the
//! coordinator collects them after joining.

use crate::types::WorkerId;
use thiserror::Error;

/// All duolog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the input collaborator or an output sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input line longer than the configured limit (reject policy)
    #[error("input line too long: {len} characters exceeds limit of {limit}")]
    InputTooLong {
        /// Length of the offending line in characters
        len: usize,
        /// Configured maximum line length
        limit: usize,
    },

    /// Input that cannot be turned into an entry (e.g. not UTF-8)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Protocol misuse: double teardown, double retire, shared ownership at teardown
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Prepend attempted after the producer closed the store
    #[error("log store is sealed; no further entries may be prepended")]
    StoreSealed,

    /// Logging collaborator failed to accept a record
    #[error("log sink error: {0}")]
    Sink(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A worker thread panicked before reaching `Terminated`
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// The worker that panicked
        worker: WorkerId,
    },

    /// A worker stopped because its peer reported a fatal error
    #[error("worker {worker} stopped after its peer failed")]
    PeerFailed {
        /// The worker that stopped
        worker: WorkerId,
    },
}

/// Result type for duolog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a protocol violation.
    ///
    /// Protocol violations indicate a bug in the caller, never bad input.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Error::ProtocolViolation(_) | Error::StoreSealed)
    }

    /// Check if this error was caused by the input stream.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InputTooLong { .. } | Error::InvalidInput(_) | Error::Io(_)
        )
    }

    /// Check if this error is a secondary failure caused by another worker.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Error::PeerFailed { .. })
    }
}
