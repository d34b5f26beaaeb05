//! Configuration type definitions

use crate::types::{
    BacklogLines, ChannelCapacity, RefreshRate, WindowSize, duration_millis_serde,
    duration_secs_serde,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Access log to follow; auto-detected when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    /// Dashboard refresh interval
    #[serde(rename = "refresh_ms")]
    pub refresh: RefreshRate,
    pub rate: RateConfig,
    pub tail: TailConfig,
    pub geoip: GeoIpConfig,
    pub logging: LoggingConfig,
}

/// Request-rate tracking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateConfig {
    /// Width of one bucket
    #[serde(
        rename = "bucket_secs",
        with = "duration_secs_serde",
        default = "super::defaults::bucket_duration"
    )]
    pub bucket: Duration,
    /// Buckets in the rolling window
    #[serde(default)]
    pub window_size: WindowSize,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            bucket: super::defaults::bucket_duration(),
            window_size: WindowSize::default(),
        }
    }
}

impl RateConfig {
    /// Span of the rolling window
    #[must_use]
    pub fn window(&self) -> Duration {
        self.bucket
            .saturating_mul(u32::try_from(self.window_size.get()).unwrap_or(u32::MAX))
    }
}

/// Log following
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TailConfig {
    /// Lines replayed at startup
    #[serde(default)]
    pub backfill_lines: BacklogLines,
    /// Only show lines written after startup
    #[serde(default)]
    pub from_end: bool,
    #[serde(
        rename = "poll_interval_ms",
        with = "duration_millis_serde",
        default = "super::defaults::poll_interval"
    )]
    pub poll_interval: Duration,
    /// Lines buffered between the tailer and the parser
    #[serde(default)]
    pub channel_capacity: ChannelCapacity,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            backfill_lines: BacklogLines::default(),
            from_end: false,
            poll_interval: super::defaults::poll_interval(),
            channel_capacity: ChannelCapacity::default(),
        }
    }
}

/// Country lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GeoIpConfig {
    /// CSV range database (`start_ip,end_ip,country_code`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Also write application logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}
