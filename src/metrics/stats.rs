//! Point-in-time rate statistics

use std::fmt;

/// Snapshot of request throughput over the tracker window
///
/// Rates are requests per second. `total` and the rates only include buckets
/// that are still inside the window at the time the snapshot was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateStats {
    /// Rate in the newest bucket
    pub current: f64,
    /// Highest bucket rate in the window
    pub peak: f64,
    /// Mean rate across populated buckets in the window
    pub average: f64,
    /// Requests counted in the window
    pub total: u64,
    /// Percentage change of the near half of the window over the far half
    pub trend_change: f64,
}

impl RateStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Classify the trend using a symmetric percentage threshold
    #[must_use]
    pub fn trend(&self, threshold_pct: f64) -> Trend {
        Trend::classify(self.trend_change, threshold_pct)
    }
}

/// Direction of the request rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// `change > threshold` is increasing, `change < -threshold` decreasing
    #[must_use]
    pub fn classify(change: f64, threshold_pct: f64) -> Self {
        if change > threshold_pct {
            Self::Increasing
        } else if change < -threshold_pct {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    #[must_use]
    pub const fn glyph(&self) -> &'static str {
        match self {
            Self::Increasing => "↑",
            Self::Decreasing => "↓",
            Self::Stable => "→",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let stats = RateStats::default();
        assert!(stats.is_empty());
        assert_eq!(stats.current, 0.0);
        assert_eq!(stats.trend_change, 0.0);
    }

    #[test]
    fn test_trend_threshold() {
        assert_eq!(Trend::classify(5.1, 5.0), Trend::Increasing);
        assert_eq!(Trend::classify(5.0, 5.0), Trend::Stable);
        assert_eq!(Trend::classify(-5.0, 5.0), Trend::Stable);
        assert_eq!(Trend::classify(-5.1, 5.0), Trend::Decreasing);
        assert_eq!(Trend::classify(0.0, 5.0), Trend::Stable);
    }

    #[test]
    fn test_trend_glyphs() {
        assert_eq!(Trend::Increasing.glyph(), "↑");
        assert_eq!(Trend::Decreasing.glyph(), "↓");
        assert_eq!(Trend::Stable.glyph(), "→");
        assert_eq!(Trend::Stable.to_string(), "stable");
    }

    #[test]
    fn test_stats_trend() {
        let stats = RateStats {
            trend_change: -40.0,
            ..RateStats::default()
        };
        assert_eq!(stats.trend(5.0), Trend::Decreasing);
    }
}
