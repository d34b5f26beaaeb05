//! TUI constants and configuration

use ratatui::style::Color;
use std::time::Duration;

/// Rate changes within ±this percentage are shown as stable
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// How often keyboard input is polled
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Layout Constants
// ============================================================================

/// Layout constraints for main UI sections
pub mod layout {
    use ratatui::layout::Constraint;

    pub const HEADER_HEIGHT: u16 = 3;
    pub const OVERVIEW_HEIGHT: u16 = 4;
    pub const TABLE_ROW_HEIGHT: u16 = 12;
    pub const MIN_TABLE_ROW_HEIGHT: u16 = 6;
    /// Stream entries plus borders
    pub const STREAM_HEIGHT: u16 = crate::aggregate::STREAM_LEN as u16 + 2;
    pub const LOG_PANEL_HEIGHT: u16 = 8;
    pub const FOOTER_HEIGHT: u16 = 3;

    pub fn main_sections(show_logs: bool) -> Vec<Constraint> {
        let mut sections = vec![
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(OVERVIEW_HEIGHT),
            Constraint::Min(MIN_TABLE_ROW_HEIGHT),
            Constraint::Length(TABLE_ROW_HEIGHT),
            Constraint::Length(STREAM_HEIGHT),
        ];
        if show_logs {
            sections.push(Constraint::Length(LOG_PANEL_HEIGHT));
        }
        sections.push(Constraint::Length(FOOTER_HEIGHT));
        sections
    }

    /// Status, paths, methods
    pub fn upper_columns() -> [Constraint; 3] {
        [
            Constraint::Percentage(35),
            Constraint::Percentage(45),
            Constraint::Percentage(20),
        ]
    }

    /// Visitors, clients, countries, sources
    pub fn lower_columns() -> [Constraint; 4] {
        [
            Constraint::Percentage(22),
            Constraint::Percentage(32),
            Constraint::Percentage(18),
            Constraint::Percentage(28),
        ]
    }
}

// ============================================================================
// Status Bars
// ============================================================================

pub mod bars {
    pub const WIDTH: usize = 16;
    pub const FILLED: char = '█';
    pub const EMPTY: char = '░';
}

// ============================================================================
// Color Palette
// ============================================================================

pub mod styles {
    use super::Color;

    pub const BORDER_PRIMARY: Color = Color::Cyan;
    pub const BORDER_NORMAL: Color = Color::White;
    pub const BORDER_MUTED: Color = Color::Gray;
    pub const LABEL: Color = Color::Gray;
    pub const VALUE_PRIMARY: Color = Color::Yellow;
    pub const VALUE_SECONDARY: Color = Color::Cyan;
    pub const RUNNING: Color = Color::Green;
    pub const PAUSED: Color = Color::Yellow;

    pub const STATUS_SUCCESS: Color = Color::Green;
    pub const STATUS_REDIRECT: Color = Color::Cyan;
    pub const STATUS_CLIENT_ERROR: Color = Color::Yellow;
    pub const STATUS_SERVER_ERROR: Color = Color::Red;
    pub const STATUS_OTHER: Color = Color::Gray;

    pub const TREND_UP: Color = Color::Green;
    pub const TREND_DOWN: Color = Color::Red;
    pub const TREND_STABLE: Color = Color::Gray;
}

// ============================================================================
// Text Constants
// ============================================================================

pub mod text {
    pub const APP_NAME: &str = "tailnginx ";
    pub const SUBTITLE: &str = "- Real-Time nginx Dashboard";
    pub const NO_DATA: &str = "No data yet";
    pub const WAITING: &str = "Waiting for requests...";

    /// Key and description pairs shown in the footer
    pub const KEY_HELP: &[(&str, &str)] = &[
        ("q", "quit"),
        ("space", "pause"),
        ("+/-", "speed"),
        ("t", "window"),
        ("2-5", "status"),
        ("esc", "clear"),
        ("l", "logs"),
    ];
}
