//! Default values for configuration fields
//!
//! Used both by serde (`#[serde(default = ...)]`) and the `Default` impls.

use crate::tailer::DEFAULT_POLL_INTERVAL;
use std::time::Duration;

/// Config file looked up when `--config` is not given
pub const CONFIG_FILE: &str = "tailnginx.toml";

/// Rate tracker bucket width
#[inline]
pub fn bucket_duration() -> Duration {
    crate::metrics::DEFAULT_BUCKET_DURATION
}

/// How often the tailer checks for appended data
#[inline]
pub fn poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

