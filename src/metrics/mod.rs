//! Request-rate metrics
//!
//! [`RateTracker`] keeps a fixed ring of time buckets and answers throughput
//! questions (current, peak, average, trend) over a rolling window. It is safe
//! to share between the ingestion task and the dashboard.

mod rate_tracker;
mod stats;

pub use rate_tracker::{DEFAULT_BUCKET_DURATION, RateTracker};
pub use stats::{RateStats, Trend};
