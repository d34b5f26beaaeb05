//! Dashboard aggregation over recently ingested entries
//!
//! The [`Aggregator`] retains a bounded history of parsed entries and turns
//! it into a [`DashboardSnapshot`] under the current status and time filters.

use crate::parser::AccessLogEntry;
use chrono::{DateTime, TimeDelta, Utc};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Entries kept in memory
pub const MAX_ENTRIES: usize = 10_000;

/// Rows in each ranked table
pub const TOP_N: usize = 10;

/// Entries shown in the live stream
pub const STREAM_LEN: usize = 15;

/// User agents longer than this are shortened with an ellipsis
pub const AGENT_MAX_CHARS: usize = 50;

/// A ranked table; fits inline for the default table size
pub type TopList = SmallVec<[TopEntry; TOP_N]>;

/// Restrict the dashboard to one class of status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusFilter {
    /// Filter selected by a digit key (`2` through `5`)
    #[must_use]
    pub const fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '2' => Some(Self::Success),
            '3' => Some(Self::Redirect),
            '4' => Some(Self::ClientError),
            '5' => Some(Self::ServerError),
            _ => None,
        }
    }

    /// Status class this filter keeps, `None` for all
    #[must_use]
    pub const fn class(self) -> Option<u16> {
        match self {
            Self::All => None,
            Self::Success => Some(2),
            Self::Redirect => Some(3),
            Self::ClientError => Some(4),
            Self::ServerError => Some(5),
        }
    }

    #[must_use]
    #[inline]
    pub fn matches(self, status: u16) -> bool {
        self.class().is_none_or(|class| status / 100 == class)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class() {
            Some(class) => write!(f, "{class}xx"),
            None => f.write_str("All"),
        }
    }
}

/// How far back the dashboard looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    TwelveHours,
    OneDay,
    SevenDays,
    ThirtyDays,
    #[default]
    AllTime,
}

impl TimeWindow {
    pub const PRESETS: [Self; 9] = [
        Self::FiveMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::ThreeHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::SevenDays,
        Self::ThirtyDays,
        Self::AllTime,
    ];

    /// Window length in minutes, `None` for all time
    #[must_use]
    pub const fn minutes(self) -> Option<i64> {
        match self {
            Self::FiveMinutes => Some(5),
            Self::ThirtyMinutes => Some(30),
            Self::OneHour => Some(60),
            Self::ThreeHours => Some(180),
            Self::TwelveHours => Some(720),
            Self::OneDay => Some(1440),
            Self::SevenDays => Some(10_080),
            Self::ThirtyDays => Some(43_200),
            Self::AllTime => None,
        }
    }

    #[must_use]
    pub fn duration(self) -> Option<TimeDelta> {
        self.minutes().map(TimeDelta::minutes)
    }

    /// The next preset, wrapping from all time back to five minutes
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::PRESETS.iter().position(|w| *w == self).unwrap_or(0);
        Self::PRESETS[(idx + 1) % Self::PRESETS.len()]
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes() {
            None => f.write_str("All time"),
            Some(m) if m < 60 => write!(f, "Last {m}m"),
            Some(m) if m < 1440 => write!(f, "Last {}h", m / 60),
            Some(m) => write!(f, "Last {}d", m / 1440),
        }
    }
}

/// One row of a ranked table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopEntry {
    pub key: String,
    pub count: usize,
}

/// Everything the dashboard renders for one refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Entries retained regardless of filters
    pub total: usize,
    /// Entries passing the current filters
    pub filtered: usize,
    pub bytes: u64,
    /// Exact status codes and their counts, ascending by code
    pub status_codes: Vec<(u16, usize)>,
    pub top_paths: TopList,
    pub top_ips: TopList,
    pub top_agents: TopList,
    pub top_methods: TopList,
    pub top_countries: TopList,
    pub top_referers: TopList,
    /// Most recent filtered entries, oldest first
    pub recent: Vec<AccessLogEntry>,
}

impl DashboardSnapshot {
    /// Sum over all status codes
    #[must_use]
    pub fn status_total(&self) -> usize {
        self.status_codes.iter().map(|(_, count)| count).sum()
    }
}

struct Counter<K>(HashMap<K, usize>);

impl<K: AsRef<str> + Eq + Hash + Ord> Counter<K> {
    fn new() -> Self {
        Self(HashMap::new())
    }

    fn add(&mut self, key: K) {
        *self.0.entry(key).or_default() += 1;
    }

    /// Highest counts first, ties broken by key
    fn top(self, n: usize) -> TopList {
        let mut rows: Vec<(K, usize)> = self.0.into_iter().collect();
        rows.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.into_iter()
            .take(n)
            .map(|(key, count)| TopEntry {
                key: key.as_ref().to_string(),
                count,
            })
            .collect()
    }
}

/// Shorten a user agent to at most [`AGENT_MAX_CHARS`] characters
#[must_use]
pub fn truncate_agent(agent: &str) -> Cow<'_, str> {
    if agent.chars().count() <= AGENT_MAX_CHARS {
        return agent.into();
    }
    let kept: String = agent.chars().take(AGENT_MAX_CHARS - 3).collect();
    format!("{kept}...").into()
}

/// Bounded entry history plus the active filters
#[derive(Debug, Clone)]
pub struct Aggregator {
    entries: VecDeque<AccessLogEntry>,
    capacity: usize,
    status_filter: StatusFilter,
    time_window: TimeWindow,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries (at least one)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(MAX_ENTRIES)),
            capacity,
            status_filter: StatusFilter::default(),
            time_window: TimeWindow::default(),
        }
    }

    pub fn push(&mut self, entry: AccessLogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = AccessLogEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    #[inline]
    pub const fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    #[must_use]
    #[inline]
    pub const fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.time_window = window;
    }

    /// Advance to the next time window preset and return it
    pub fn cycle_time_window(&mut self) -> TimeWindow {
        self.time_window = self.time_window.next();
        self.time_window
    }

    /// Aggregate the entries passing the current filters as of `now`
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        let cutoff = self.time_window.duration().map(|window| now - window);
        let filtered: Vec<&AccessLogEntry> = self
            .entries
            .iter()
            .filter(|e| self.status_filter.matches(e.status))
            .filter(|e| cutoff.is_none_or(|cutoff| e.time >= cutoff))
            .collect();

        let mut statuses: HashMap<u16, usize> = HashMap::new();
        let mut paths = Counter::new();
        let mut ips = Counter::new();
        let mut methods = Counter::new();
        let mut agents = Counter::new();
        let mut countries = Counter::new();
        let mut referers = Counter::new();
        let mut bytes = 0u64;

        for entry in &filtered {
            *statuses.entry(entry.status).or_default() += 1;
            paths.add(entry.path.as_str());
            ips.add(entry.ip.as_str());
            methods.add(entry.method.as_str());
            agents.add(truncate_agent(&entry.user_agent));
            if let Some(country) = entry.country.as_deref() {
                countries.add(country);
            }
            if let Some(referer) = entry.referer() {
                referers.add(referer);
            }
            bytes = bytes.saturating_add(entry.bytes);
        }

        let mut status_codes: Vec<(u16, usize)> = statuses.into_iter().collect();
        status_codes.sort_unstable();

        DashboardSnapshot {
            total: self.entries.len(),
            filtered: filtered.len(),
            bytes,
            status_codes,
            top_paths: paths.top(TOP_N),
            top_ips: ips.top(TOP_N),
            top_agents: agents.top(TOP_N),
            top_methods: methods.top(TOP_N),
            top_countries: countries.top(TOP_N),
            top_referers: referers.top(TOP_N),
            recent: filtered[filtered.len().saturating_sub(STREAM_LEN)..]
                .iter()
                .map(|&e| e.clone())
                .collect(),
        }
    }
}
