//! tailnginx: real-time nginx access log monitor
//!
//! Lines flow from the [`tailer`] through the [`parser`] into shared
//! [`ingest::IngestState`], which feeds the rolling request-rate
//! [`metrics`] and the dashboard [`aggregate`]s shown by the [`tui`].

pub mod aggregate;
pub mod args;
pub mod config;
pub mod detector;
pub mod formatting;
pub mod geoip;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod runtime;
pub mod tailer;
pub mod tui;
pub mod types;
pub mod version;

pub use aggregate::{Aggregator, DashboardSnapshot, StatusFilter, TimeWindow, TopEntry};
pub use config::{Config, ConfigSource, create_default_config, load_config};
pub use detector::{LogFile, detect_log_files, validate_log_path};
pub use geoip::GeoLocator;
pub use ingest::{IngestState, run_ingest};
pub use metrics::{RateStats, RateTracker, Trend};
pub use parser::{AccessLogEntry, ParseError, parse_line};
pub use tailer::{TailOptions, tail_lines};
