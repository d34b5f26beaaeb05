//! Tests for the rolling request-rate tracker
//!
//! Exercises bucket placement, window ageing and concurrent recording
//! through the public API, using fixed timestamps via `stats_at`.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;
use tailnginx::metrics::{RateTracker, Trend};
use tailnginx::types::WindowSize;

/// Four 10-second buckets: a 40s window split into two 20s halves
fn small_tracker() -> RateTracker {
    RateTracker::new(Duration::from_secs(10), WindowSize::new(4).unwrap())
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + ChronoDuration::seconds(secs)
}

#[test]
fn test_empty_tracker_reports_zero() {
    let tracker = small_tracker();
    let stats = tracker.stats_at(t0());
    assert!(stats.is_empty());
    assert_eq!(stats.current, 0.0);
    assert_eq!(stats.trend(5.0), Trend::Stable);
}

#[test]
fn test_single_bucket_rates() {
    let tracker = small_tracker();
    for _ in 0..3 {
        tracker.record(at(1));
    }
    let stats = tracker.stats_at(at(5));
    assert_eq!(stats.total, 3);
    assert!((stats.current - 0.3).abs() < 1e-9);
    assert!((stats.peak - 0.3).abs() < 1e-9);
    assert!((stats.average - 0.3).abs() < 1e-9);
    assert_eq!(stats.trend_change, 0.0);
}

#[test]
fn test_burst_in_default_tracker() {
    let tracker = RateTracker::new(Duration::from_secs(10), WindowSize::DEFAULT);
    tracker.record_n(at(3), 100);
    let stats = tracker.stats_at(at(3));
    assert!((stats.current - 10.0).abs() < 1e-9);
    assert_eq!(stats.total, 100);
}

#[test]
fn test_events_spread_over_three_buckets() {
    let tracker = RateTracker::new(Duration::from_secs(10), WindowSize::DEFAULT);
    tracker.record_n(at(0), 50);
    tracker.record_n(at(15), 60);
    tracker.record_n(at(25), 70);
    let stats = tracker.stats_at(at(25));
    assert_eq!(stats.total, 180);
    assert!((stats.peak - 7.0).abs() < 1e-9);
    assert!((stats.current - 7.0).abs() < 1e-9);
}

#[test]
fn test_peak_and_average_across_buckets() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 10);
    tracker.record_n(at(10), 30);
    tracker.record_n(at(20), 20);

    let stats = tracker.stats_at(at(25));
    assert_eq!(stats.total, 60);
    assert!((stats.current - 2.0).abs() < 1e-9);
    assert!((stats.peak - 3.0).abs() < 1e-9);
    assert!((stats.average - 2.0).abs() < 1e-9);
}

#[test]
fn test_trend_compares_window_halves() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 2);
    tracker.record_n(at(10), 2);
    tracker.record_n(at(20), 3);
    tracker.record_n(at(30), 3);

    let stats = tracker.stats_at(at(35));
    assert!((stats.trend_change - 50.0).abs() < 1e-9);
    assert_eq!(stats.trend(5.0), Trend::Increasing);
    assert_eq!(stats.trend(60.0), Trend::Stable);
}

#[test]
fn test_decreasing_trend() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 10);
    tracker.record_n(at(10), 10);
    tracker.record_n(at(30), 5);

    let stats = tracker.stats_at(at(35));
    assert!((stats.trend_change + 75.0).abs() < 1e-9);
    assert_eq!(stats.trend(5.0), Trend::Decreasing);
}

#[test]
fn test_equal_halves_are_stable() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 5);
    tracker.record_n(at(30), 5);

    let stats = tracker.stats_at(at(35));
    assert_eq!(stats.total, 10);
    assert_eq!(stats.trend_change, 0.0);
    assert_eq!(stats.trend(0.0), Trend::Stable);
}

#[test]
fn test_buckets_age_out_of_window() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 4);
    tracker.record_n(at(30), 1);

    let stats = tracker.stats_at(at(35));
    assert_eq!(stats.total, 5);
    assert!((stats.peak - 0.4).abs() < 1e-9);

    // The first bucket is now more than 40s old
    let stats = tracker.stats_at(at(45));
    assert_eq!(stats.total, 1);
    assert!((stats.peak - 0.1).abs() < 1e-9);
    assert!((stats.average - 0.1).abs() < 1e-9);
    assert!((stats.current - 0.1).abs() < 1e-9);

    assert!(tracker.stats_at(at(500)).is_empty());
    // Aged buckets stay in the ring until overwritten
    assert_eq!(tracker.retained(), 5);
}

#[test]
fn test_aged_bucket_leaves_trend_split() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 4);
    tracker.record_n(at(10), 2);
    tracker.record_n(at(30), 1);

    // At t+35 both t0 and t+10 are in the older half: (1 - 6) / 6
    let stats = tracker.stats_at(at(35));
    assert!((stats.trend_change - (-5.0 / 6.0 * 100.0)).abs() < 1e-9);

    // At t+45 only t+10 remains in the older half: (1 - 2) / 2
    let stats = tracker.stats_at(at(45));
    assert_eq!(stats.total, 3);
    assert!((stats.trend_change + 50.0).abs() < 1e-9);
    assert!((stats.peak - 0.2).abs() < 1e-9);
    assert!((stats.average - 0.15).abs() < 1e-9);
}

#[test]
fn test_far_future_timestamp_does_not_stall_tracker() {
    let tracker = small_tracker();
    let now = at(0);
    tracker.record_n_at(now + ChronoDuration::days(365), 1, now);
    for i in 0..100 {
        tracker.record_n_at(now - ChronoDuration::seconds(i % 30), 1, now);
    }

    assert_eq!(tracker.retained(), 101);
    let stats = tracker.stats_at(now + ChronoDuration::seconds(5));
    assert_eq!(stats.total, 101);
    assert!(stats.current > 0.1);
}

#[test]
fn test_far_future_timestamp_against_wall_clock() {
    let tracker = RateTracker::default();
    let now = Utc::now();
    tracker.record(now + ChronoDuration::days(365));
    for i in 0..100 {
        tracker.record(now + ChronoDuration::seconds(i % 50));
    }

    assert_eq!(tracker.retained(), 101);
    let stats = tracker.stats_at(now + ChronoDuration::seconds(50));
    assert_eq!(stats.total, 101);
    assert!(stats.current > 0.0);
}

#[test]
fn test_gap_longer_than_window_clears_ring() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 5);
    tracker.record(at(1000));
    assert_eq!(tracker.retained(), 1);
    assert_eq!(tracker.stats_at(at(1000)).total, 1);
}

#[test]
fn test_late_events_land_in_their_own_bucket() {
    let tracker = small_tracker();
    tracker.record(at(30));
    tracker.record(at(2));
    tracker.record(at(12));
    assert_eq!(tracker.retained(), 3);

    let stats = tracker.stats_at(at(35));
    // The newest bucket still only holds the t+30 event
    assert!((stats.current - 0.1).abs() < 1e-9);
    assert_eq!(stats.total, 3);

    // Four buckets behind the newest cannot be held
    tracker.record(at(-10));
    assert_eq!(tracker.retained(), 3);
}

#[test]
fn test_reset_clears_everything() {
    let tracker = small_tracker();
    tracker.record_n(at(0), 7);
    tracker.reset();
    assert_eq!(tracker.retained(), 0);
    assert!(tracker.stats_at(at(1)).is_empty());
    assert_eq!(tracker.window_size(), 4);
}

#[test]
fn test_window_geometry() {
    let tracker = small_tracker();
    assert_eq!(tracker.bucket_duration(), Duration::from_secs(10));
    assert_eq!(tracker.window(), Duration::from_secs(40));

    let default = RateTracker::default();
    assert_eq!(default.window_size(), 60);
    assert_eq!(default.window(), Duration::from_secs(600));
}

#[test]
fn test_concurrent_recording_is_lossless() {
    let tracker = small_tracker();
    std::thread::scope(|scope| {
        for thread in 0..8i64 {
            let tracker = &tracker;
            scope.spawn(move || {
                for i in 0..1000i64 {
                    // Spread across every bucket in arbitrary arrival order
                    tracker.record(at(((thread + i) % 4) * 10));
                }
            });
        }
    });

    assert_eq!(tracker.retained(), 8000);
    assert_eq!(tracker.stats_at(at(35)).total, 8000);
}

#[test]
fn test_concurrent_readers_and_writer() {
    let tracker = small_tracker();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..2000 {
                tracker.record(at(i % 40));
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let stats = tracker.stats_at(at(39));
                    assert!(stats.total <= 2000);
                    assert!(stats.peak >= stats.current || stats.current == 0.0);
                }
            });
        }
    });
    assert_eq!(tracker.retained(), 2000);
}
