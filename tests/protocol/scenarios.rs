//! Normal sessions

use crate::common::*;
use duolog::prelude::*;
use duolog::BufReadSource;
use std::io::{self, BufReader, Cursor, Read};
use std::time::Duration;

#[test]
fn two_commands_then_sentinel() {
    let (report, sink) = run_lines(&["a", "b", ""], WatchMode::Notify);

    assert_eq!(report.entries, vec!["b", "a"]);
    assert_eq!(report.completion, Completion::Finished);
    assert!(report.all_terminated());
    assert_eq!(sink.count(|e| *e == LogEvent::UpdatedHead), 2);
    assert_eq!(
        sink.count(|e| *e == LogEvent::DeallocateStore { entries: 2 }),
        1
    );

    // The final head is always reported
    assert_eq!(reported_heads(&sink).last().map(String::as_str), Some("b"));
    assert_protocol_order(&report, &sink);
}

#[test]
fn immediate_sentinel() {
    let (report, sink) = run_lines(&[""], WatchMode::Notify);

    assert!(report.entries.is_empty());
    assert_eq!(sink.count(|e| *e == LogEvent::UpdatedHead), 0);
    assert!(reported_heads(&sink).is_empty());
    assert_eq!(
        sink.count(|e| *e == LogEvent::DeallocateStore { entries: 0 }),
        1
    );
    assert_protocol_order(&report, &sink);
}

#[test]
fn end_of_input_acts_as_sentinel() {
    let (report, sink) = run_lines(&["only"], WatchMode::Notify);

    assert_eq!(report.entries, vec!["only"]);
    assert_eq!(report.completion, Completion::Finished);
    assert_protocol_order(&report, &sink);
}

#[test]
fn lines_after_sentinel_are_not_read() {
    let (report, sink) = run_lines(&["x", "", "never"], WatchMode::Notify);

    assert_eq!(report.entries, vec!["x"]);
    assert!(!reported_heads(&sink).iter().any(|h| h == "never"));
}

#[test]
fn slow_producer_every_head_reported_in_poll_mode() {
    let sink = MemorySink::new();
    let report = Coordinator::builder()
        .poll_interval(FAST_INTERVAL)
        .watch_mode(WatchMode::Poll)
        .source(ScriptedSource::new(["one", "two", "three", ""]).with_delay(Duration::from_millis(60)))
        .sink(sink.clone())
        .run()
        .unwrap();

    assert_eq!(report.entries, vec!["three", "two", "one"]);
    assert_eq!(reported_heads(&sink), vec!["one", "two", "three"]);
    assert_protocol_order(&report, &sink);
}

#[test]
fn slow_producer_every_head_reported_in_notify_mode() {
    let sink = MemorySink::new();
    let report = Coordinator::builder()
        .poll_interval(Duration::from_secs(2))
        .source(ScriptedSource::new(["one", "two", ""]).with_delay(Duration::from_millis(40)))
        .sink(sink.clone())
        .run()
        .unwrap();

    assert_eq!(reported_heads(&sink), vec!["one", "two"]);
    assert_protocol_order(&report, &sink);
}

#[test]
fn final_head_not_lost_with_long_interval() {
    // The producer finishes long before the interval elapses; the observer
    // must still report the last head before tearing down.
    let sink = MemorySink::new();
    let report = Coordinator::builder()
        .poll_interval(Duration::from_millis(200))
        .watch_mode(WatchMode::Poll)
        .source(ScriptedSource::new(["p", "q", "r", ""]))
        .sink(sink.clone())
        .run()
        .unwrap();

    assert_eq!(reported_heads(&sink).last().map(String::as_str), Some("r"));
    assert_protocol_order(&report, &sink);
}

#[test]
fn oversize_lines_are_truncated() {
    let (report, sink) = run_lines(&["abcdefghijklmnopqrstuvwxyz", ""], WatchMode::Notify);

    assert_eq!(report.entries, vec!["abcdefghijklmnopqr"]);
    assert_eq!(reported_heads(&sink), vec!["abcdefghijklmnopqr"]);
}

#[test]
fn reads_from_buffered_reader() {
    let input = Cursor::new(b"ls\r\npwd\n\nignored\n".to_vec());
    let report = Coordinator::builder()
        .poll_interval(FAST_INTERVAL)
        .source(BufReadSource::new(input))
        .sink(MemorySink::new())
        .run()
        .unwrap();

    assert_eq!(report.entries, vec!["pwd", "ls"]);
}

#[test]
fn endless_line_is_truncated_without_buffering_it() {
    let endless = BufReader::new(io::repeat(b'z').take(20_000_000));
    let report = Coordinator::builder()
        .poll_interval(FAST_INTERVAL)
        .source(BufReadSource::new(endless))
        .sink(MemorySink::new())
        .run()
        .unwrap();

    assert_eq!(report.entries, vec!["z".repeat(18)]);
}

#[test]
fn endless_line_rejected_under_strict_policy() {
    let endless = BufReader::new(io::repeat(b'z').take(20_000_000));
    let err = Coordinator::builder()
        .poll_interval(FAST_INTERVAL)
        .oversize(OversizePolicy::Reject)
        .source(BufReadSource::new(endless))
        .sink(MemorySink::new())
        .run()
        .unwrap_err();

    assert!(matches!(err, duolog::Error::InputTooLong { limit: 18, .. }));
}

#[test]
fn exactly_one_producer_under_race() {
    for _ in 0..200 {
        let (report, sink) = run_lines(&["a", "b", ""], WatchMode::Notify);

        let producers = report.workers.iter().filter(|w| w.role == Role::Producer).count();
        assert_eq!(producers, 1);
        assert_eq!(report.entries, vec!["b", "a"]);

        let producer = report.workers.iter().find(|w| w.role == Role::Producer).unwrap();
        assert_eq!(producer.worker, report.producer);
        assert_eq!(producer.entries_written, 2);
        assert!(producer.teardown.is_none());
        assert_eq!(report.observer().unwrap().entries_written, 0);

        assert_protocol_order(&report, &sink);
    }
}
