//! Logging collaborator
//!
//! The journal is the only path from the protocol to its log output. It
//! allocates a sequence number for every event while holding the sink, so
//! records reach the sink in strictly increasing sequence order even when
//! both workers log at once.

use duolog_core::{LogEvent, LogRecord, Result, SequenceCounter, WorkerId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Destination for log records.
///
/// Rendering (clock format, field order) belongs entirely to the sink.
pub trait LogSink: Send {
    /// Accept one record
    fn emit(&mut self, record: &LogRecord) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Sequenced event log shared by both workers.
pub struct Journal {
    sink: Mutex<Box<dyn LogSink>>,
    sequence: SequenceCounter,
    pid: u32,
}

impl Journal {
    /// Create a journal writing to `sink`
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        Journal {
            sink: Mutex::new(sink),
            sequence: SequenceCounter::new(),
            pid: std::process::id(),
        }
    }

    /// Record one event attributed to `worker`
    ///
    /// Returns the sequence number assigned to the record.
    pub fn record(&self, worker: WorkerId, event: LogEvent) -> Result<u64> {
        let mut sink = self.sink.lock();
        let sequence = self.sequence.next();
        let record = LogRecord::now(sequence, worker, self.pid, event);
        tracing::debug!(
            sequence,
            worker = %worker,
            event = record.event.kind(),
            "{}",
            record.event
        );
        sink.emit(&record)?;
        Ok(sequence)
    }

    /// Number of records handed out so far
    pub fn events_logged(&self) -> u64 {
        self.sequence.current()
    }

    /// Flush the sink
    pub fn flush(&self) -> Result<()> {
        self.sink.lock().flush()
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("events_logged", &self.events_logged())
            .field("pid", &self.pid)
            .finish()
    }
}

/// In-memory sink.
///
/// Clones share the same record list, so a test can keep one clone and hand
/// the other to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record emitted so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Events emitted so far, in emission order
    pub fn events(&self) -> Vec<LogEvent> {
        self.records.lock().iter().map(|r| r.event.clone()).collect()
    }

    /// Rendered messages emitted so far
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.event.to_string())
            .collect()
    }

    /// Number of emitted records matching `pred`
    pub fn count(&self, pred: impl Fn(&LogEvent) -> bool) -> usize {
        self.records.lock().iter().filter(|r| pred(&r.event)).count()
    }
}

impl LogSink for MemorySink {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Sink forwarding every record to `tracing` at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        tracing::info!(
            target: "duolog::journal",
            sequence = record.sequence,
            worker = %record.worker,
            pid = record.pid,
            "{}",
            record.event
        );
        Ok(())
    }
}
