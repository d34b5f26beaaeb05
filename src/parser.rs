//! Parsing of nginx `combined` format access log lines
//!
//! ```text
//! 127.0.0.1 - - [08/Oct/2025:12:00:00 +0000] "GET /index.html HTTP/1.1" 200 612 "-" "curl/7.68.0"
//! ```

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Timestamp layout used between the square brackets
const TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

static COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<ip>\S+) \S+ \S+ \[(?P<time>[^\]]+)\] "(?P<method>\S+) (?P<path>\S+) (?P<proto>[^"]+)" (?P<status>\d{3}) (?P<bytes>\d+|-) "(?P<referer>[^"]*)" "(?P<agent>[^"]*)""#,
    )
    .expect("combined log regex is valid")
});

/// Reasons a line could not be turned into an [`AccessLogEntry`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("line does not match the combined log format")]
    NoMatch,

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid byte count '{0}'")]
    InvalidBytes(String),
}

/// One request from the access log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub ip: String,
    pub time: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub status: u16,
    pub bytes: u64,
    /// Referer header, `-` when absent
    pub referer: String,
    pub user_agent: String,
    /// ISO country code, filled in by the ingestion pipeline
    pub country: Option<Arc<str>>,
}

impl AccessLogEntry {
    /// First digit of the status code (2 for 2xx, 4 for 4xx, ...)
    #[must_use]
    #[inline]
    pub const fn status_class(&self) -> u16 {
        self.status / 100
    }

    /// Referer if the client sent one
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        match self.referer.as_str() {
            "" | "-" => None,
            referer => Some(referer),
        }
    }
}

/// Parse a single access log line
///
/// Lines whose timestamp cannot be read are rejected: every entry must be
/// placeable on the timeline.
pub fn parse_line(line: &str) -> Result<AccessLogEntry, ParseError> {
    let caps = COMBINED.captures(line.trim_end()).ok_or(ParseError::NoMatch)?;

    let time_str = &caps["time"];
    let time = DateTime::parse_from_str(time_str, TIME_FORMAT)
        .map_err(|_| ParseError::InvalidTimestamp(time_str.to_string()))?
        .with_timezone(&Utc);

    // Three ASCII digits always fit
    let status = caps["status"].parse::<u16>().unwrap_or_default();

    let bytes = match &caps["bytes"] {
        "-" => 0,
        value => value
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidBytes(value.to_string()))?,
    };

    Ok(AccessLogEntry {
        ip: caps["ip"].to_string(),
        time,
        method: caps["method"].to_string(),
        path: caps["path"].to_string(),
        protocol: caps["proto"].to_string(),
        status,
        bytes,
        referer: caps["referer"].to_string(),
        user_agent: caps["agent"].to_string(),
        country: None,
    })
}
