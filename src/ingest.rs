//! Line ingestion: parse, enrich, batch, record
//!
//! Lines from the tailer are parsed and tagged with a country, then applied in
//! batches so the dashboard lock is taken at most once per batch.

use crate::aggregate::Aggregator;
use crate::geoip::GeoLocator;
use crate::metrics::RateTracker;
use crate::parser::{AccessLogEntry, parse_line};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Entries applied together
pub const BATCH_SIZE: usize = 100;

/// Pending entries are applied at least this often
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// State shared between the ingestion task and the dashboard
#[derive(Debug)]
pub struct IngestState {
    tracker: RateTracker,
    aggregator: Mutex<Aggregator>,
    changed: AtomicBool,
    ingested: AtomicU64,
    skipped: AtomicU64,
}

impl Default for IngestState {
    fn default() -> Self {
        Self::new(RateTracker::default())
    }
}

impl IngestState {
    #[must_use]
    pub fn new(tracker: RateTracker) -> Self {
        Self {
            tracker,
            aggregator: Mutex::new(Aggregator::new()),
            changed: AtomicBool::new(false),
            ingested: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    #[must_use]
    #[inline]
    pub fn tracker(&self) -> &RateTracker {
        &self.tracker
    }

    /// Lock the aggregator, recovering from a panicked holder
    pub fn aggregator(&self) -> MutexGuard<'_, Aggregator> {
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a batch of entries and flag the dashboard for a refresh
    pub fn apply(&self, batch: Vec<AccessLogEntry>) {
        if batch.is_empty() {
            return;
        }
        for entry in &batch {
            self.tracker.record(entry.time);
        }
        let count = batch.len() as u64;
        self.aggregator().extend(batch);
        self.ingested.fetch_add(count, Ordering::Relaxed);
        self.mark_changed();
    }

    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Whether anything changed since the last call
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries parsed and applied so far
    #[must_use]
    pub fn ingested(&self) -> u64 {
        self.ingested.load(Ordering::Relaxed)
    }

    /// Lines that could not be parsed
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Consume lines until the channel closes
///
/// Any partial batch is applied before returning.
pub async fn run_ingest(
    mut lines: mpsc::Receiver<String>,
    state: Arc<IngestState>,
    geo: Arc<GeoLocator>,
) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    let mut flush = tokio::time::interval(FLUSH_INTERVAL);
    flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                match parse_line(&line) {
                    Ok(mut entry) => {
                        entry.country = geo.lookup(&entry.ip);
                        batch.push(entry);
                        if batch.len() >= BATCH_SIZE {
                            state.apply(std::mem::replace(&mut batch, Vec::with_capacity(BATCH_SIZE)));
                        }
                    }
                    Err(e) => {
                        trace!("Skipping line: {}", e);
                        state.record_skipped();
                    }
                }
            }
            _ = flush.tick() => {
                if !batch.is_empty() {
                    state.apply(std::mem::take(&mut batch));
                }
            }
        }
    }

    state.apply(batch);
    debug!(
        "Ingestion finished: {} entries, {} skipped lines",
        state.ingested(),
        state.skipped()
    );
}
