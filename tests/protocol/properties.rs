//! Property tests over arbitrary command scripts

use crate::common::*;
use duolog::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn entries_are_input_reversed(lines in prop::collection::vec("[a-z0-9 ]{1,18}", 0..24)) {
        let mut script: Vec<&str> = lines.iter().map(String::as_str).collect();
        script.push("");

        let (report, sink) = run_lines(&script, WatchMode::Notify);

        let mut expected = lines.clone();
        expected.reverse();
        prop_assert_eq!(&report.entries, &expected);
        prop_assert_eq!(sink.count(|e| *e == LogEvent::UpdatedHead), lines.len());

        // Reported heads are a subsequence of the written heads, ending in
        // the final one
        let heads = reported_heads(&sink);
        prop_assert!(heads.len() <= lines.len());
        prop_assert_eq!(heads.last(), lines.last());
        let mut cursor = lines.iter();
        for head in &heads {
            prop_assert!(cursor.any(|l| l == head), "head {} out of order", head);
        }

        assert_protocol_order(&report, &sink);
    }
}
