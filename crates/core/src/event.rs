//! Log events reported by the producer/observer protocol
//!
//! The core never formats output itself. It hands a [`LogRecord`] to the
//! logging collaborator for every event below, and guarantees each record
//! carries a unique, strictly increasing sequence number.

use crate::types::WorkerId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reportable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// The role registry was assigned (emitted once, by the producer)
    Allocate,
    /// The producer prepended a new head entry
    UpdatedHead,
    /// The observer saw a new head entry
    FirstEntry {
        /// Text of the new head
        text: String,
    },
    /// The observer released the role registry
    DeallocateRegistry,
    /// The observer tore down the shared log store
    DeallocateStore {
        /// Number of entries released
        entries: usize,
    },
    /// The worker is leaving its runner loop
    Exiting,
}

impl LogEvent {
    /// Build a `FirstEntry` event
    pub fn first_entry(text: impl Into<String>) -> Self {
        LogEvent::FirstEntry { text: text.into() }
    }

    /// Short machine-friendly name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            LogEvent::Allocate => "allocate",
            LogEvent::UpdatedHead => "updated_head",
            LogEvent::FirstEntry { .. } => "first_entry",
            LogEvent::DeallocateRegistry => "deallocate_registry",
            LogEvent::DeallocateStore { .. } => "deallocate_store",
            LogEvent::Exiting => "exiting",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::Allocate => write!(f, "ALLOCATE THREADDATA"),
            LogEvent::UpdatedHead => write!(f, "UPDATED FIRST NODE"),
            LogEvent::FirstEntry { text } => write!(f, "FIRST NODE IN THE LIST IS: {}", text),
            LogEvent::DeallocateRegistry => write!(f, "DEALLOCATE THREADDATA"),
            LogEvent::DeallocateStore { .. } => write!(f, "DEALLOCATE LINKED LIST"),
            LogEvent::Exiting => write!(f, "EXITING THREAD RUNNER FUNCTION"),
        }
    }
}

/// The tuple handed to the logging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Strictly increasing, unique per record
    pub sequence: u64,
    /// Worker that produced the event
    pub worker: WorkerId,
    /// Process identifier
    pub pid: u32,
    /// Wall-clock time the event was recorded
    pub timestamp: DateTime<Local>,
    /// What happened
    pub event: LogEvent,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn now(sequence: u64, worker: WorkerId, pid: u32, event: LogEvent) -> Self {
        LogRecord {
            sequence,
            worker,
            pid,
            timestamp: Local::now(),
            event,
        }
    }
}
