//! TUI rendering and layout

use crate::aggregate::{DashboardSnapshot, TopEntry};
use crate::formatting::{format_bytes, format_count, format_rate, format_uptime};
use crate::tui::app::TuiApp;
use crate::tui::constants::{TREND_THRESHOLD_PCT, layout, styles, text};
use crate::tui::helpers::{bar, country_label, percentage, status_color, trend_color, truncate};
use ratatui::{
    Frame,
    layout::{Alignment, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the main UI
pub fn render_ui(f: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(layout::main_sections(app.show_logs()))
        .split(f.area());

    render_header(f, chunks[0], app);
    render_overview(f, chunks[1], app);
    render_upper_tables(f, chunks[2], app.snapshot());
    render_lower_tables(f, chunks[3], app.snapshot());
    render_stream(f, chunks[4], app.snapshot());
    if app.show_logs() {
        render_logs(f, chunks[5], app);
    }
    render_footer(f, chunks[chunks.len() - 1]);
}

fn label(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(styles::LABEL))
}

fn value(text: impl Into<String>, color: Color) -> Span<'static> {
    Span::styled(
        text.into(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn panel(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color))
}

/// Render the title bar
fn render_header(f: &mut Frame, area: Rect, app: &TuiApp) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            text::APP_NAME,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(text::SUBTITLE, Style::default().fg(Color::White)),
        label("  |  "),
        Span::styled(
            app.log_path().display().to_string(),
            Style::default().fg(styles::VALUE_SECONDARY),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(styles::BORDER_PRIMARY)),
    )
    .alignment(Alignment::Center);

    f.render_widget(header, area);
}

/// Render request counts, run state and the rate line
fn render_overview(f: &mut Frame, area: Rect, app: &TuiApp) {
    let snapshot = app.snapshot();
    let rate = app.rate();
    let trend = rate.trend(TREND_THRESHOLD_PCT);

    let (state_text, state_color) = if app.is_paused() {
        ("Paused", styles::PAUSED)
    } else {
        ("Running", styles::RUNNING)
    };

    let mut first = vec![
        label("Requests: "),
        value(snapshot.filtered.to_string(), styles::VALUE_PRIMARY),
        label(format!(" / {}", format_count(snapshot.total as u64))),
        label("  |  Window: "),
        value(app.time_window().to_string(), styles::VALUE_SECONDARY),
        label("  |  Uptime: "),
        value(format_uptime(app.uptime()), Color::Green),
        label("  |  "),
        value(state_text, state_color),
        label("  |  Filter: "),
        value(app.status_filter().to_string(), styles::VALUE_SECONDARY),
        label("  |  Refresh: "),
        value(app.refresh_rate().to_string(), Color::White),
    ];
    if app.skipped() > 0 {
        first.push(label("  |  Skipped: "));
        first.push(value(format_count(app.skipped()), Color::Red));
    }

    let second = vec![
        label("Rate: "),
        value(format_rate(rate.current), styles::VALUE_PRIMARY),
        Span::styled(
            format!(" {} {:+.1}%", trend.glyph(), rate.trend_change),
            Style::default().fg(trend_color(trend)),
        ),
        label("  |  Peak: "),
        value(format_rate(rate.peak), Color::Magenta),
        label("  |  Avg: "),
        value(format_rate(rate.average), Color::Blue),
        label("  |  Transferred: "),
        value(format_bytes(snapshot.bytes), Color::White),
    ];

    let overview = Paragraph::new(vec![Line::from(first), Line::from(second)])
        .block(panel("Overview", styles::BORDER_NORMAL))
        .alignment(Alignment::Left);

    f.render_widget(overview, area);
}

fn render_upper_tables(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::upper_columns())
        .split(area);

    render_status(f, columns[0], snapshot);
    render_top(f, columns[1], "Paths", &snapshot.top_paths, snapshot.filtered, |k| {
        k.to_string()
    });
    render_top(f, columns[2], "Methods", &snapshot.top_methods, snapshot.filtered, |k| {
        k.to_string()
    });
}

fn render_lower_tables(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::lower_columns())
        .split(area);

    let total = snapshot.filtered;
    render_top(f, columns[0], "Visitors", &snapshot.top_ips, total, |k| {
        k.to_string()
    });
    render_top(f, columns[1], "Clients", &snapshot.top_agents, total, |k| {
        k.to_string()
    });
    render_top(f, columns[2], "Countries", &snapshot.top_countries, total, country_label);
    render_top(f, columns[3], "Sources", &snapshot.top_referers, total, |k| {
        k.to_string()
    });
}

/// Status codes with proportional bars
fn render_status(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let total = snapshot.status_total();
    let max = snapshot
        .status_codes
        .iter()
        .map(|(_, count)| *count)
        .max()
        .unwrap_or(0);

    let items: Vec<ListItem> = if snapshot.status_codes.is_empty() {
        vec![ListItem::new(label(text::NO_DATA))]
    } else {
        snapshot
            .status_codes
            .iter()
            .map(|&(status, count)| {
                let color = status_color(status);
                ListItem::new(Line::from(vec![
                    value(format!("{status} "), color),
                    Span::styled(bar(count, max), Style::default().fg(color)),
                    Span::styled(format!(" {count:>6}"), Style::default().fg(Color::White)),
                    label(format!(" {:5.1}%", percentage(count, total))),
                ]))
            })
            .collect()
    };

    f.render_widget(
        List::new(items).block(panel("Status", styles::BORDER_NORMAL)),
        area,
    );
}

/// A ranked table: count, share and key
fn render_top(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[TopEntry],
    total: usize,
    display: impl Fn(&str) -> String,
) {
    // Borders plus the count and percentage columns
    let key_width = usize::from(area.width.saturating_sub(2 + 15)).max(8);

    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new(label(text::NO_DATA))]
    } else {
        rows.iter()
            .map(|row| {
                ListItem::new(Line::from(vec![
                    value(format!("{:>6}", row.count), styles::VALUE_PRIMARY),
                    label(format!(" {:5.1}% ", percentage(row.count, total))),
                    Span::styled(
                        truncate(&display(&row.key), key_width),
                        Style::default().fg(Color::White),
                    ),
                ]))
            })
            .collect()
    };

    f.render_widget(
        List::new(items).block(panel(title, styles::BORDER_NORMAL)),
        area,
    );
}

/// Most recent requests, newest last
fn render_stream(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let path_width = usize::from(area.width.saturating_sub(2 + 24)).max(8);

    let items: Vec<ListItem> = if snapshot.recent.is_empty() {
        vec![ListItem::new(label(text::WAITING))]
    } else {
        snapshot
            .recent
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        entry.time.format("%H:%M:%S ").to_string(),
                        Style::default()
                            .fg(Color::Gray)
                            .add_modifier(Modifier::DIM),
                    ),
                    Span::styled(
                        format!("{:<7} ", entry.method),
                        Style::default().fg(Color::Yellow),
                    ),
                    value(format!("{} ", entry.status), status_color(entry.status)),
                    Span::styled(
                        truncate(&entry.path, path_width),
                        Style::default().fg(Color::White),
                    ),
                ]))
            })
            .collect()
    };

    f.render_widget(
        List::new(items).block(panel("Live Stream", styles::BORDER_NORMAL)),
        area,
    );
}

/// Application log panel
fn render_logs(f: &mut Frame, area: Rect, app: &TuiApp) {
    let visible = usize::from(area.height.saturating_sub(2));
    let items: Vec<ListItem> = app
        .log_lines(visible)
        .into_iter()
        .map(|line| ListItem::new(Span::styled(line, Style::default().fg(Color::Gray))))
        .collect();

    f.render_widget(
        List::new(items).block(panel("Logs", styles::BORDER_MUTED)),
        area,
    );
}

/// Render footer with key help
fn render_footer(f: &mut Frame, area: Rect) {
    let mut spans = Vec::with_capacity(text::KEY_HELP.len() * 3);
    for (idx, (key, action)) in text::KEY_HELP.iter().enumerate() {
        if idx > 0 {
            spans.push(label("  "));
        }
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(label(format!(" {action}")));
    }

    let footer = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(styles::BORDER_MUTED)),
        )
        .alignment(Alignment::Center);

    f.render_widget(footer, area);
}
