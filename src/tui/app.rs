//! TUI application state and logic

use crate::aggregate::{DashboardSnapshot, StatusFilter, TimeWindow};
use crate::ingest::IngestState;
use crate::metrics::RateStats;
use crate::tui::LogBuffer;
use crate::types::RefreshRate;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// TUI application state
pub struct TuiApp {
    /// Shared with the ingestion task
    state: Arc<IngestState>,
    log_path: PathBuf,
    log_buffer: Option<LogBuffer>,
    started: Instant,
    refresh: RefreshRate,
    paused: bool,
    show_logs: bool,
    snapshot: DashboardSnapshot,
    rate: RateStats,
}

impl TuiApp {
    #[must_use]
    pub fn new(state: Arc<IngestState>, log_path: impl Into<PathBuf>, refresh: RefreshRate) -> Self {
        Self {
            state,
            log_path: log_path.into(),
            log_buffer: None,
            started: Instant::now(),
            refresh,
            paused: false,
            show_logs: false,
            snapshot: DashboardSnapshot::default(),
            rate: RateStats::default(),
        }
    }

    /// Attach the buffer shown by the log panel
    #[must_use]
    pub fn with_log_buffer(mut self, log_buffer: LogBuffer) -> Self {
        self.log_buffer = Some(log_buffer);
        self
    }

    /// Pull fresh statistics unless paused
    ///
    /// The rate is re-read on every call since it decays without new data; the
    /// aggregate snapshot is only rebuilt when ingestion flagged a change.
    /// Returns whether anything was refreshed.
    pub fn update(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.rate = self.state.tracker().stats();
        if self.state.take_changed() {
            self.snapshot = self.state.aggregator().snapshot(Utc::now());
        }
        true
    }

    /// Apply a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return KeyOutcome::Quit;
            }
            KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Char('+' | '=') => self.refresh = self.refresh.faster(),
            KeyCode::Char('-' | '_') => self.refresh = self.refresh.slower(),
            KeyCode::Char('t') => self.cycle_time_window(),
            KeyCode::Char(digit @ '2'..='5') => {
                if let Some(filter) = StatusFilter::from_digit(digit) {
                    self.set_status_filter(filter);
                }
            }
            KeyCode::Esc => self.set_status_filter(StatusFilter::All),
            KeyCode::Char('l') => self.show_logs = !self.show_logs,
            _ => {}
        }
        KeyOutcome::Continue
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn cycle_time_window(&mut self) {
        let window = self.state.aggregator().cycle_time_window();
        tracing::debug!("Time window set to {}", window);
        self.state.mark_changed();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.state.aggregator().set_status_filter(filter);
        self.state.mark_changed();
    }

    #[must_use]
    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub const fn rate(&self) -> &RateStats {
        &self.rate
    }

    #[must_use]
    pub fn status_filter(&self) -> StatusFilter {
        self.state.aggregator().status_filter()
    }

    #[must_use]
    pub fn time_window(&self) -> TimeWindow {
        self.state.aggregator().time_window()
    }

    #[must_use]
    pub const fn refresh_rate(&self) -> RefreshRate {
        self.refresh
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn show_logs(&self) -> bool {
        self.show_logs
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Lines that could not be parsed so far
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.state.skipped()
    }

    /// Newest application log lines for the log panel
    #[must_use]
    pub fn log_lines(&self, count: usize) -> Vec<String> {
        self.log_buffer
            .as_ref()
            .map(|buffer| buffer.recent_lines(count))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> TuiApp {
        TuiApp::new(
            Arc::new(IngestState::default()),
            "/var/log/nginx/access.log",
            RefreshRate::DEFAULT,
        )
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), KeyOutcome::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        );
        assert_eq!(app.handle_key(key(KeyCode::Char('c'))), KeyOutcome::Continue);
        // Esc clears the filter instead of quitting
        assert_eq!(app.handle_key(key(KeyCode::Esc)), KeyOutcome::Continue);
    }

    #[test]
    fn test_refresh_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('+')));
        assert_eq!(app.refresh_rate().get(), Duration::from_millis(900));
        app.handle_key(key(KeyCode::Char('-')));
        app.handle_key(key(KeyCode::Char('_')));
        assert_eq!(app.refresh_rate().get(), Duration::from_millis(1100));
        app.handle_key(key(KeyCode::Char('=')));
        assert_eq!(app.refresh_rate().get(), Duration::from_millis(1000));
    }

    #[test]
    fn test_pause_stops_updates() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.is_paused());
        assert!(!app.update());
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.update());
    }

    #[test]
    fn test_filter_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.status_filter(), StatusFilter::ClientError);
        app.handle_key(key(KeyCode::Char('9')));
        assert_eq!(app.status_filter(), StatusFilter::ClientError);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.status_filter(), StatusFilter::All);

        assert_eq!(app.time_window(), TimeWindow::AllTime);
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.time_window(), TimeWindow::FiveMinutes);
    }

    #[test]
    fn test_toggle_logs() {
        let mut app = app();
        assert!(!app.show_logs());
        app.handle_key(key(KeyCode::Char('l')));
        assert!(app.show_logs());
        assert!(app.log_lines(5).is_empty());
    }

    #[test]
    fn test_update_picks_up_ingested_data() {
        let state = Arc::new(IngestState::default());
        let mut app = TuiApp::new(state.clone(), "access.log", RefreshRate::DEFAULT);
        let line = r#"1.2.3.4 - - [08/Oct/2025:12:00:00 +0000] "GET / HTTP/1.1" 200 5 "-" "x""#;
        state.apply(vec![parse_line(line).unwrap()]);

        assert!(app.update());
        assert_eq!(app.snapshot().total, 1);

        // Filter changes force a rebuild on the next update
        app.set_status_filter(StatusFilter::ServerError);
        app.update();
        assert_eq!(app.snapshot().filtered, 0);
    }
}
