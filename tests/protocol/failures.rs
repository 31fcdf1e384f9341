//! Failure propagation
//!
//! A fatal error in either worker ends the session with an error; the other
//! worker is never left waiting.

use duolog::prelude::*;
use duolog::{Error, MIN_SHUTDOWN_GRACE};
use std::io;
use std::sync::mpsc;
use std::time::Duration;

/// Yields its lines, then fails.
struct BrokenSource {
    lines: Vec<String>,
}

impl LineSource for BrokenSource {
    fn read_line(&mut self) -> Result<Option<String>> {
        if self.lines.is_empty() {
            return Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed")));
        }
        Ok(Some(self.lines.remove(0)))
    }
}

struct PanickingSource;

impl LineSource for PanickingSource {
    fn read_line(&mut self) -> Result<Option<String>> {
        panic!("input collaborator exploded");
    }
}

struct FailingSink;

impl LogSink for FailingSink {
    fn emit(&mut self, _record: &LogRecord) -> Result<()> {
        Err(Error::Sink("log device unavailable".to_string()))
    }
}

fn builder() -> CoordinatorBuilder {
    // Long interval: a hang would show up as a slow test, not a pass
    Coordinator::builder().poll_interval(Duration::from_secs(2))
}

#[test]
fn read_error_fails_session() {
    let sink = MemorySink::new();
    let err = builder()
        .source(BrokenSource {
            lines: vec!["a".to_string()],
        })
        .sink(sink.clone())
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)), "{:?}", err);
    // The observer still released both resources exactly once
    assert_eq!(sink.count(|e| *e == LogEvent::DeallocateRegistry), 1);
    assert_eq!(
        sink.count(|e| *e == LogEvent::DeallocateStore { entries: 1 }),
        1
    );
}

#[test]
fn rejected_line_fails_session() {
    let err = builder()
        .max_line_len(4)
        .oversize(OversizePolicy::Reject)
        .source(ScriptedSource::new(["fine", "too long", ""]))
        .sink(MemorySink::new())
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::InputTooLong { len: 8, limit: 4 }));
    assert!(err.is_input_error());
}

#[test]
fn producer_panic_is_reported() {
    let sink = MemorySink::new();
    let err = builder()
        .source(PanickingSource)
        .sink(sink.clone())
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::WorkerPanicked { .. }), "{:?}", err);
    assert_eq!(sink.count(|e| matches!(e, LogEvent::DeallocateStore { .. })), 1);
}

#[test]
fn sink_failure_fails_session() {
    let err = builder()
        .source(ScriptedSource::new(["a", ""]))
        .sink(FailingSink)
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::Sink(_)), "{:?}", err);
}

/// Serves one command, then never returns from the next read.
struct StalledStdin {
    served: bool,
}

impl LineSource for StalledStdin {
    fn read_line(&mut self) -> Result<Option<String>> {
        if !self.served {
            self.served = true;
            return Ok(Some("ls".to_string()));
        }
        std::thread::sleep(Duration::from_secs(3600));
        Ok(None)
    }
}

struct RefuseHeadReports;

impl LogSink for RefuseHeadReports {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        if matches!(record.event, LogEvent::FirstEntry { .. }) {
            return Err(Error::Sink("head report refused".to_string()));
        }
        Ok(())
    }
}

#[test]
fn observer_failure_reported_while_producer_blocked_in_read() {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = Coordinator::builder()
            .poll_interval(Duration::from_millis(50))
            .source(StalledStdin { served: false })
            .sink(RefuseHeadReports)
            .run();
        let _ = tx.send(result.map(|r| r.entries));
    });

    let result = rx
        .recv_timeout(MIN_SHUTDOWN_GRACE + Duration::from_secs(5))
        .expect("run must return instead of joining the blocked producer");
    assert!(matches!(result, Err(Error::Sink(_))), "{:?}", result);
}
