//! Shared helpers for integration tests.

#![allow(dead_code)]

use duolog::prelude::*;
use std::time::Duration;

/// Interval short enough that poll-mode runs finish quickly.
pub const FAST_INTERVAL: Duration = Duration::from_millis(5);

/// Run one session over `lines`, returning the report and the captured log.
pub fn run_lines(lines: &[&str], mode: WatchMode) -> (RunReport, MemorySink) {
    let sink = MemorySink::new();
    let report = Coordinator::builder()
        .poll_interval(FAST_INTERVAL)
        .watch_mode(mode)
        .source(ScriptedSource::new(lines.iter().copied()))
        .sink(sink.clone())
        .run()
        .expect("session should complete");
    (report, sink)
}

/// Position of the first event matching `pred`
pub fn position(events: &[LogEvent], pred: impl Fn(&LogEvent) -> bool) -> Option<usize> {
    events.iter().position(pred)
}

/// Check the ordering rules every successful run obeys.
pub fn assert_protocol_order(report: &RunReport, sink: &MemorySink) {
    let records = sink.records();
    let events = sink.events();

    // Sequence numbers are dense and increasing in emission order
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.sequence, i as u64 + 1, "record {} out of order", i);
    }

    // The producer allocates before anything else happens
    assert_eq!(events.first(), Some(&LogEvent::Allocate));
    assert_eq!(records[0].worker, report.producer);
    assert_eq!(sink.count(|e| *e == LogEvent::Allocate), 1);

    // Exactly one teardown of each resource, registry first
    assert_eq!(sink.count(|e| *e == LogEvent::DeallocateRegistry), 1);
    assert_eq!(
        sink.count(|e| matches!(e, LogEvent::DeallocateStore { .. })),
        1
    );
    let registry_at = position(&events, |e| *e == LogEvent::DeallocateRegistry).unwrap();
    let store_at = position(&events, |e| matches!(e, LogEvent::DeallocateStore { .. })).unwrap();
    assert!(registry_at < store_at);

    // Nothing is reported or written after the store is gone
    assert!(events[store_at..]
        .iter()
        .all(|e| !matches!(e, LogEvent::FirstEntry { .. } | LogEvent::UpdatedHead)));

    // Every reported head was written first
    let mut updates = 0usize;
    let mut reported = 0usize;
    for event in &events {
        match event {
            LogEvent::UpdatedHead => updates += 1,
            LogEvent::FirstEntry { .. } => {
                reported += 1;
                assert!(reported <= updates, "head reported before it was written");
            }
            _ => {}
        }
    }

    // Both workers exit exactly once
    let mut exited: Vec<WorkerId> = records
        .iter()
        .filter(|r| r.event == LogEvent::Exiting)
        .map(|r| r.worker)
        .collect();
    exited.sort_by_key(|w| w.as_u64());
    exited.dedup();
    assert_eq!(exited.len(), 2);

    // Teardown is attributed to the observer
    let observer = report.observer().expect("observer report").worker;
    assert_eq!(records[store_at].worker, observer);
    assert_ne!(observer, report.producer);
}

/// Heads reported by the observer, in order
pub fn reported_heads(sink: &MemorySink) -> Vec<String> {
    sink.events()
        .into_iter()
        .filter_map(|e| match e {
            LogEvent::FirstEntry { text } => Some(text),
            _ => None,
        })
        .collect()
}
