//! Tracing setup for dashboard and headless modes
//!
//! The level comes from `RUST_LOG` (default `info`). With a dashboard the
//! events go to the in-memory [`LogBuffer`]; headless they go to stdout.
//! Either way an optional log file receives a plain-text copy.

use crate::tui::{LogBuffer, LogMakeWriter};
use std::path::Path;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Non-blocking appender for `path`
///
/// The worker guard is forgotten so the file stays open for the program
/// lifetime.
fn file_writer(path: &Path) -> NonBlocking {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or(path.as_os_str());
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    std::mem::forget(guard);
    non_blocking
}

/// Install the global subscriber
///
/// Returns the buffer backing the dashboard's log panel, or `None` when
/// `headless`.
pub fn init_logging(headless: bool, log_file: Option<&Path>) -> Option<LogBuffer> {
    // Added first in both modes so it layers directly on the registry
    let file_layer = log_file.map(|path| {
        tracing_subscriber::fmt::layer()
            .with_writer(file_writer(path))
            .with_ansi(false)
            .with_filter(env_filter())
    });

    if headless {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_filter(env_filter()),
            )
            .init();
        return None;
    }

    let log_buffer = LogBuffer::new();
    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(LogMakeWriter::new(log_buffer.clone()))
                .with_ansi(false)
                .with_target(false)
                .compact()
                .with_filter(env_filter()),
        )
        .init();

    Some(log_buffer)
}
