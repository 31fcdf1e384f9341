//! Console rendering of log records.
//!
//! Plain output keeps the classic layout:
//!
//! ```text
//! Logindex 3, thread 1, PID 4242, 19/10/2026  03:07:55 pm: UPDATED FIRST NODE
//! ```
//!
//! with a 12-hour clock and day/month/year ordering.

use duolog_core::{Error, LogRecord, Result};
use duolog_engine::LogSink;
use std::io::{self, Write};

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Classic one-line text
    Plain,
    /// One JSON object per line
    Json,
    /// Forward to the tracing subscriber
    Tracing,
}

impl OutputMode {
    /// Parse the `--format` value
    pub fn from_arg(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(OutputMode::Plain),
            "json" => Some(OutputMode::Json),
            "tracing" => Some(OutputMode::Tracing),
            _ => None,
        }
    }
}

/// Render a record in the classic text layout.
pub fn format_plain(record: &LogRecord) -> String {
    format!(
        "Logindex {}, thread {}, PID {}, {}: {}",
        record.sequence,
        record.worker,
        record.pid,
        record.timestamp.format("%d/%m/%Y  %I:%M:%S %P"),
        record.event
    )
}

/// Render a record as a single JSON line.
pub fn format_json(record: &LogRecord) -> Result<String> {
    serde_json::to_string(record).map_err(|e| Error::Sink(e.to_string()))
}

/// Sink writing rendered records to stdout, one line per record.
///
/// Only the console layouts have a sink here; `tracing` output goes through
/// the engine's `TracingSink`.
#[derive(Debug)]
pub struct ConsoleSink {
    json: bool,
    out: io::Stdout,
}

impl ConsoleSink {
    /// Classic text lines
    pub fn plain() -> Self {
        ConsoleSink {
            json: false,
            out: io::stdout(),
        }
    }

    /// One JSON object per line
    pub fn json() -> Self {
        ConsoleSink {
            json: true,
            out: io::stdout(),
        }
    }

    fn render(&self, record: &LogRecord) -> Result<String> {
        if self.json {
            format_json(record)
        } else {
            Ok(format_plain(record))
        }
    }
}

impl LogSink for ConsoleSink {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        let line = self.render(record)?;
        let mut out = self.out.lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}
