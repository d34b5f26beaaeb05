//! Property-based tests using proptest
//!
//! These tests verify invariants of the parser, the rate tracker and the
//! aggregator using arbitrary input generation.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use proptest::prelude::*;
use std::time::Duration;
use tailnginx::aggregate::{Aggregator, StatusFilter, TOP_N};
use tailnginx::formatting::format_bytes;
use tailnginx::metrics::RateTracker;
use tailnginx::parser::parse_line;
use tailnginx::types::{RefreshRate, WindowSize};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap()
}

// =============================================================================
// 1. parse_line - robustness and field extraction
// =============================================================================

proptest! {
    #[test]
    fn prop_parse_never_panics(s in ".*") {
        let _ = parse_line(&s);
    }

    #[test]
    fn prop_parse_extracts_fields(
        a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255,
        method in "(GET|POST|PUT|DELETE|HEAD|PATCH)",
        path in "/[a-zA-Z0-9/_.?=&-]{0,40}",
        status in 100u16..600,
        bytes in any::<u32>(),
        agent in "[a-zA-Z0-9/. ();-]{0,60}",
        offset_secs in 0i64..86_400,
    ) {
        let time = base() + ChronoDuration::seconds(offset_secs);
        let line = format!(
            r#"{a}.{b}.{c}.{d} - - [{}] "{method} {path} HTTP/1.1" {status} {bytes} "-" "{agent}""#,
            time.format("%d/%b/%Y:%H:%M:%S %z"),
        );

        let entry = parse_line(&line).unwrap();
        prop_assert_eq!(entry.ip, format!("{a}.{b}.{c}.{d}"));
        prop_assert_eq!(entry.method, method);
        prop_assert_eq!(entry.path, path);
        prop_assert_eq!(entry.status, status);
        prop_assert_eq!(entry.bytes, u64::from(bytes));
        prop_assert_eq!(entry.user_agent, agent);
        prop_assert_eq!(entry.time, time);
    }
}

// =============================================================================
// 2. RateTracker - conservation and bounds
// =============================================================================

proptest! {
    #[test]
    fn prop_tracker_conserves_events_within_window(
        offsets in prop::collection::vec(0i64..600, 1..300),
    ) {
        // 60 buckets of 10s: every offset below 600s fits in the ring
        let tracker = RateTracker::new(Duration::from_secs(10), WindowSize::new(60).unwrap());
        for offset in &offsets {
            tracker.record(base() + ChronoDuration::seconds(*offset));
        }
        prop_assert_eq!(tracker.retained(), offsets.len() as u64);
    }

    #[test]
    fn prop_tracker_stats_are_bounded(
        offsets in prop::collection::vec(0i64..2_000, 1..300),
        now_offset in 0i64..2_500,
    ) {
        let tracker = RateTracker::new(Duration::from_secs(10), WindowSize::new(20).unwrap());
        for offset in &offsets {
            tracker.record(base() + ChronoDuration::seconds(*offset));
        }

        let stats = tracker.stats_at(base() + ChronoDuration::seconds(now_offset));
        prop_assert!(stats.total <= tracker.retained());
        prop_assert!(tracker.retained() <= offsets.len() as u64);
        prop_assert!(stats.peak >= stats.average);
        prop_assert!(stats.current >= 0.0);
        prop_assert!(stats.trend_change >= -100.0);
    }
}

// =============================================================================
// 3. Aggregator - filtering and ranking invariants
// =============================================================================

proptest! {
    #[test]
    fn prop_snapshot_counts_are_consistent(
        statuses in prop::collection::vec(prop::sample::select(vec![200u16, 204, 301, 304, 404, 418, 500, 503]), 1..200),
        filter_digit in prop::sample::select(vec!['2', '3', '4', '5']),
    ) {
        let mut aggregator = Aggregator::new();
        for (i, status) in statuses.iter().enumerate() {
            let line = format!(
                r#"10.0.0.{} - - [08/Oct/2025:12:00:00 +0000] "GET /p{} HTTP/1.1" {status} 100 "-" "agent""#,
                i % 250,
                i % 17,
            );
            aggregator.push(parse_line(&line).unwrap());
        }

        let filter = StatusFilter::from_digit(filter_digit).unwrap();
        aggregator.set_status_filter(filter);
        let snapshot = aggregator.snapshot(base());

        let expected = statuses.iter().filter(|s| filter.matches(**s)).count();
        prop_assert_eq!(snapshot.total, statuses.len());
        prop_assert_eq!(snapshot.filtered, expected);
        prop_assert_eq!(snapshot.status_total(), expected);
        prop_assert!(snapshot.top_paths.len() <= TOP_N);
        prop_assert!(snapshot.top_paths.windows(2).all(|w| w[0].count >= w[1].count));
        prop_assert!(snapshot.top_paths.iter().map(|e| e.count).sum::<usize>() <= expected);
    }
}

// =============================================================================
// 4. Formatting and refresh clamping
// =============================================================================

proptest! {
    #[test]
    fn prop_format_bytes_never_empty(bytes in any::<u64>()) {
        prop_assert!(!format_bytes(bytes).is_empty());
    }

    #[test]
    fn prop_refresh_rate_is_clamped(millis in any::<u64>()) {
        let rate = RefreshRate::from_millis(millis);
        prop_assert!(rate.get() >= RefreshRate::MIN);
        prop_assert!(rate.get() <= RefreshRate::MAX);
    }
}
