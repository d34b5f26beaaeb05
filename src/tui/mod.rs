//! Terminal dashboard
//!
//! Renders live request statistics while the ingestion task runs in the
//! background. The refresh interval is adjustable at runtime; keyboard input is
//! polled on a separate, faster tick.

mod app;
mod constants;
mod helpers;
pub mod log_capture;
mod panic_hook;
mod ui;

pub use app::{KeyOutcome, TuiApp};
pub use constants::TREND_THRESHOLD_PCT;
pub use log_capture::{LogBuffer, LogMakeWriter};
pub use ui::render_ui;

use anyhow::Result;
use constants::INPUT_POLL_INTERVAL;
use panic_hook::PanicHookGuard;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// Setup the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    // Clear first so escape sequences don't leak to the shell
    terminal.clear()?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn refresh_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Run the dashboard until the user quits or `shutdown_rx` fires
///
/// Sends on `shutdown_tx` when the dashboard exits so the rest of the program
/// can stop.
pub async fn run_tui(
    mut app: TuiApp,
    shutdown_tx: mpsc::Sender<()>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Restore the terminal even if rendering panics
    let hook = PanicHookGuard::install(|| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    });

    let result = run_app(&mut terminal, &mut app, &mut shutdown_rx).await;

    drop(hook);
    restore_terminal(&mut terminal)?;

    let _ = shutdown_tx.send(()).await;

    result
}

/// Main TUI event loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut TuiApp,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let mut refresh = app.refresh_rate();
    let mut refresh_tick = refresh_interval(refresh.get());
    let mut input_tick = refresh_interval(INPUT_POLL_INTERVAL);

    app.update();
    terminal.draw(|f| ui::render_ui(f, app))?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                break;
            }
            _ = refresh_tick.tick() => {
                if app.update() {
                    terminal.draw(|f| ui::render_ui(f, app))?;
                }
            }
            _ = input_tick.tick() => {
                let mut redraw = false;
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if app.handle_key(key) == KeyOutcome::Quit {
                                return Ok(());
                            }
                            redraw = true;
                        }
                        Event::Resize(..) => redraw = true,
                        _ => {}
                    }
                }

                if app.refresh_rate() != refresh {
                    refresh = app.refresh_rate();
                    refresh_tick = refresh_interval(refresh.get());
                }
                if redraw {
                    app.update();
                    terminal.draw(|f| ui::render_ui(f, app))?;
                }
            }
        }
    }

    Ok(())
}
