//! TUI rendering helper functions

use ratatui::style::Color;

use super::constants::{bars, styles};
use crate::geoip::country_name;
use crate::metrics::Trend;

/// Color for an HTTP status code
#[must_use]
pub const fn status_color(status: u16) -> Color {
    match status / 100 {
        2 => styles::STATUS_SUCCESS,
        3 => styles::STATUS_REDIRECT,
        4 => styles::STATUS_CLIENT_ERROR,
        5 => styles::STATUS_SERVER_ERROR,
        _ => styles::STATUS_OTHER,
    }
}

#[must_use]
pub const fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Increasing => styles::TREND_UP,
        Trend::Decreasing => styles::TREND_DOWN,
        Trend::Stable => styles::TREND_STABLE,
    }
}

/// Share of `total` as a percentage, 0 when `total` is 0
#[must_use]
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Horizontal bar proportional to `count / max`
#[must_use]
pub fn bar(count: usize, max: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        (count.min(max) * bars::WIDTH).div_ceil(max)
    };
    let mut bar = String::with_capacity(bars::WIDTH * 3);
    bar.extend(std::iter::repeat_n(bars::FILLED, filled));
    bar.extend(std::iter::repeat_n(bars::EMPTY, bars::WIDTH - filled));
    bar
}

/// Cut `text` to `max` characters, marking the cut with `…`
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// `DE Germany` style label for a country code
#[must_use]
pub fn country_label(code: &str) -> String {
    match country_name(code) {
        name if name == code => code.to_string(),
        name => format!("{code} {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_color() {
        assert_eq!(status_color(200), Color::Green);
        assert_eq!(status_color(301), Color::Cyan);
        assert_eq!(status_color(404), Color::Yellow);
        assert_eq!(status_color(503), Color::Red);
        assert_eq!(status_color(101), Color::Gray);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 0).chars().filter(|c| *c == bars::FILLED).count(), 0);
        assert_eq!(bar(10, 10).chars().filter(|c| *c == bars::FILLED).count(), bars::WIDTH);
        assert_eq!(bar(5, 10).chars().filter(|c| *c == bars::FILLED).count(), bars::WIDTH / 2);
        // Any nonzero count stays visible
        assert_eq!(bar(1, 1000).chars().filter(|c| *c == bars::FILLED).count(), 1);
        assert_eq!(bar(3, 10).chars().count(), bars::WIDTH);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("/short", 10), "/short");
        assert_eq!(truncate("/a/very/long/path", 8), "/a/very…");
        assert_eq!(truncate("/a/very/long/path", 8).chars().count(), 8);
    }

    #[test]
    fn test_country_label() {
        assert_eq!(country_label("DE"), "DE Germany");
        assert_eq!(country_label("QQ"), "QQ");
    }
}
