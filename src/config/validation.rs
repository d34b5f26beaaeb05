//! Configuration validation
//!
//! Zero and out-of-range values are rejected by the newtypes during
//! deserialization; this checks the constraints spanning several fields.

use anyhow::Result;
use std::time::Duration;

use super::types::Config;

/// Polling slower than this makes the live stream feel stuck
const MAX_RECOMMENDED_POLL: Duration = Duration::from_secs(5);

impl Config {
    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.rate.bucket.is_zero() {
            anyhow::bail!("rate.bucket_secs must be at least 1");
        }
        if self.tail.poll_interval.is_zero() {
            anyhow::bail!("tail.poll_interval_ms must be at least 1");
        }
        if let Some(path) = &self.log_path
            && path.as_os_str().is_empty()
        {
            anyhow::bail!("log_path cannot be empty");
        }

        if self.tail.poll_interval > MAX_RECOMMENDED_POLL {
            tracing::warn!(
                "tail.poll_interval_ms is {:?} (> {:?}); new lines will show up late",
                self.tail.poll_interval,
                MAX_RECOMMENDED_POLL
            );
        }

        Ok(())
    }
}
