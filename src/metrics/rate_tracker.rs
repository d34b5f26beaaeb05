//! Rolling request-rate tracking over a fixed ring of time buckets
//!
//! Every recorded event is attributed to the bucket its own timestamp falls
//! into, so arrival order does not matter. Memory use is fixed by the window
//! size regardless of request volume: writes are O(1) amortized and reads are
//! O(window size).

use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use super::stats::RateStats;
use crate::types::WindowSize;

/// Default span of a single bucket
pub const DEFAULT_BUCKET_DURATION: Duration = Duration::from_secs(10);

/// One slot of the ring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bucket {
    /// Bucket start in epoch milliseconds, `None` until the slot is written
    start: Option<i64>,
    count: u64,
}

/// Mutable state guarded by the tracker lock
#[derive(Debug)]
struct Ring {
    buckets: Vec<Bucket>,
    /// Slot holding the newest bucket
    cursor: usize,
    /// Sum of all slot counts
    total: u64,
}

impl Ring {
    fn new(len: usize) -> Self {
        Self {
            buckets: vec![Bucket::default(); len],
            cursor: 0,
            total: 0,
        }
    }

    /// Empty a slot and drop its count from the running total
    fn clear(&mut self, index: usize) {
        let old = std::mem::take(&mut self.buckets[index]);
        self.total = self.total.saturating_sub(old.count);
    }

    /// Find (or make room for) the slot representing `start`
    ///
    /// Slot `cursor - k` always represents `cursor_start - k * bucket_ms` or is
    /// empty, so a bucket is located by its offset from the cursor. Returns
    /// `None` when `start` is older than anything the ring can hold.
    fn slot_for(&mut self, start: i64, bucket_ms: i64) -> Option<usize> {
        let len = self.buckets.len();
        let Some(newest) = self.buckets[self.cursor].start else {
            self.buckets[self.cursor].start = Some(start);
            return Some(self.cursor);
        };

        let offset = (start - newest) / bucket_ms;
        if offset > 0 {
            // Clear every slot the cursor passes; a gap longer than the
            // window empties the whole ring.
            let steps = usize::try_from(offset).map_or(len, |steps| steps.min(len));
            for _ in 0..steps {
                self.cursor = (self.cursor + 1) % len;
                self.clear(self.cursor);
            }
            self.buckets[self.cursor].start = Some(start);
            return Some(self.cursor);
        }
        if offset == 0 {
            return Some(self.cursor);
        }

        let behind = usize::try_from(offset.unsigned_abs())
            .ok()
            .filter(|behind| *behind < len)?;
        let index = (self.cursor + len - behind) % len;
        if self.buckets[index].start != Some(start) {
            self.clear(index);
            self.buckets[index].start = Some(start);
        }
        Some(index)
    }
}

/// Time-bucketed request counter with rolling statistics
///
/// Shared between the ingestion task and the dashboard through an `Arc`;
/// all methods take `&self` and synchronize internally.
#[derive(Debug)]
pub struct RateTracker {
    bucket_duration: Duration,
    bucket_ms: i64,
    state: RwLock<Ring>,
}

impl RateTracker {
    /// Create a tracker keeping `window_size` buckets of `bucket_duration` each
    ///
    /// Bucket durations are kept at millisecond precision; anything below one
    /// millisecond is raised to one millisecond.
    #[must_use]
    pub fn new(bucket_duration: Duration, window_size: WindowSize) -> Self {
        let bucket_ms = i64::try_from(bucket_duration.as_millis())
            .unwrap_or(i64::MAX)
            .max(1);
        let bucket_duration = Duration::from_millis(bucket_ms.unsigned_abs());
        Self {
            bucket_duration,
            bucket_ms,
            state: RwLock::new(Ring::new(window_size.get())),
        }
    }

    #[must_use]
    pub const fn bucket_duration(&self) -> Duration {
        self.bucket_duration
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.read().buckets.len()
    }

    /// Total span covered by the ring
    #[must_use]
    pub fn window(&self) -> Duration {
        let len = u32::try_from(self.window_size()).unwrap_or(u32::MAX);
        self.bucket_duration.saturating_mul(len)
    }

    /// Record a single request at `at`
    #[inline]
    pub fn record(&self, at: DateTime<Utc>) {
        self.record_n(at, 1);
    }

    /// Record `count` simultaneous requests at `at`
    ///
    /// Never fails. Requests older than the retained span cannot be
    /// represented by any slot and leave the ring unchanged.
    #[inline]
    pub fn record_n(&self, at: DateTime<Utc>, count: u64) {
        self.record_n_at(at, count, Utc::now());
    }

    /// Record `count` requests at `at`, judged against the clock reading `now`
    ///
    /// The ring never advances more than one bucket past `now`. A timestamp
    /// further ahead than that is counted in the bucket holding `now`, so one
    /// skewed line cannot push every later event out of the window.
    pub fn record_n_at(&self, at: DateTime<Utc>, count: u64, now: DateTime<Utc>) {
        let now_start = self.truncate(now);
        let mut start = self.truncate(at);
        if start > now_start.saturating_add(self.bucket_ms) {
            start = now_start;
        }
        let mut ring = self.write();
        let Some(index) = ring.slot_for(start, self.bucket_ms) else {
            return;
        };
        let bucket = &mut ring.buckets[index];
        bucket.count = bucket.count.saturating_add(count);
        ring.total = ring.total.saturating_add(count);
    }

    /// Statistics as of the current wall-clock time
    #[must_use]
    pub fn stats(&self) -> RateStats {
        self.stats_at(Utc::now())
    }

    /// Statistics as of `now`
    ///
    /// Only buckets no older than the window count towards peak, average,
    /// total, and the trend split. Buckets dated after `now` are treated as
    /// part of the recent half.
    #[must_use]
    pub fn stats_at(&self, now: DateTime<Utc>) -> RateStats {
        let ring = self.read();
        if ring.total == 0 {
            return RateStats::default();
        }

        let len = i64::try_from(ring.buckets.len()).unwrap_or(i64::MAX);
        let window_ms = self.bucket_ms.saturating_mul(len);
        let half_ms = self.bucket_ms.saturating_mul(len / 2);
        let now_ms = now.timestamp_millis();

        let mut valid = 0u64;
        let mut peak = 0u64;
        let mut total = 0u64;
        let mut recent = 0u64;
        let mut previous = 0u64;

        for bucket in &ring.buckets {
            let Some(start) = bucket.start else {
                continue;
            };
            let age = now_ms.saturating_sub(start);
            if age > window_ms {
                continue;
            }

            valid += 1;
            peak = peak.max(bucket.count);
            total = total.saturating_add(bucket.count);
            if age <= half_ms {
                recent = recent.saturating_add(bucket.count);
            } else {
                previous = previous.saturating_add(bucket.count);
            }
        }

        if valid == 0 {
            return RateStats::default();
        }

        let bucket_secs = self.bucket_duration.as_secs_f64();
        let trend_change = if previous > 0 {
            (recent as f64 - previous as f64) / previous as f64 * 100.0
        } else {
            0.0
        };

        RateStats {
            current: ring.buckets[ring.cursor].count as f64 / bucket_secs,
            peak: peak as f64 / bucket_secs,
            average: total as f64 / (valid as f64 * bucket_secs),
            total,
            trend_change,
        }
    }

    /// Sum of every count still held by the ring, including buckets that
    /// have aged past the window but not yet been overwritten
    #[must_use]
    pub fn retained(&self) -> u64 {
        self.read().total
    }

    /// Clear all buckets
    pub fn reset(&self) {
        let mut ring = self.write();
        let len = ring.buckets.len();
        *ring = Ring::new(len);
    }

    /// Floor a timestamp to its bucket start (epoch aligned)
    fn truncate(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp_millis().div_euclid(self.bucket_ms) * self.bucket_ms
    }

    // A panic elsewhere never leaves the ring half-updated (every mutation
    // completes before the guard drops), so poisoned locks are recovered.
    fn read(&self) -> RwLockReadGuard<'_, Ring> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateTracker {
    /// 10-second buckets over a 10-minute window
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_DURATION, WindowSize::DEFAULT)
    }
}
