//! Runtime wiring shared by the binary
//!
//! This module provides:
//! - Runtime construction and shutdown signal handling
//! - Log path resolution, GeoIP and tailer setup from the config
//! - The headless stats loop used with `--no-tui`

use crate::config::{Config, TailConfig};
use crate::detector::{best_log_file, detect_log_files, validate_log_path};
use crate::formatting::{format_bytes, format_rate};
use crate::geoip::GeoLocator;
use crate::ingest::IngestState;
use crate::tailer::TailOptions;
use crate::tui::TREND_THRESHOLD_PCT;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Worker threads for the tailer, ingestion and dashboard tasks
const WORKER_THREADS: usize = 2;

/// Build the multi-threaded Tokio runtime
pub fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(WORKER_THREADS)
        .thread_name("tailnginx-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// The log to follow: the configured path, validated, or the best detected one
pub fn resolve_log_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.log_path {
        return validate_log_path(path).context("Invalid log path");
    }

    let logs = detect_log_files().context(
        "No nginx log files found. Pass one with --log \
         (tried /var/log/nginx/, /usr/local/nginx/logs/, /opt/nginx/logs/)",
    )?;
    let best = best_log_file(&logs).context("No nginx log files found")?;

    info!("Auto-detected nginx log: {}", best.path.display());
    if logs.len() > 1 {
        info!("Found {} nginx log files:", logs.len());
        for (idx, log) in logs.iter().enumerate() {
            let marker = if log.path == best.path { "→" } else { " " };
            let server = log
                .server_name
                .as_deref()
                .map(|name| format!(" ({name})"))
                .unwrap_or_default();
            info!(
                "  {} {}. {}{} [{}]",
                marker,
                idx + 1,
                log.path.display(),
                server,
                format_bytes(log.size)
            );
        }
        info!("Use --log to monitor a different file");
    }

    Ok(best.path.clone())
}

/// GeoIP lookups from the configured database, or none when unavailable
#[must_use]
pub fn open_geo_locator(config: &Config) -> GeoLocator {
    let Some(path) = &config.geoip.database else {
        return GeoLocator::new();
    };
    match GeoLocator::open(path) {
        Ok(locator) => locator,
        Err(e) => {
            warn!("GeoIP disabled: {}", e);
            GeoLocator::new()
        }
    }
}

/// Tailer options from the `[tail]` section
#[must_use]
pub fn tail_options(tail: &TailConfig) -> TailOptions {
    TailOptions {
        backfill_lines: tail.backfill_lines,
        from_end: tail.from_end,
        poll_interval: tail.poll_interval,
        channel_capacity: tail.channel_capacity,
    }
}

/// One-line summary of the current statistics
#[must_use]
pub fn stats_summary(state: &IngestState) -> String {
    let rate = state.tracker().stats();
    let snapshot = state.aggregator().snapshot(Utc::now());
    let trend = rate.trend(TREND_THRESHOLD_PCT);
    format!(
        "requests={} window_total={} rate={} {} ({:+.1}%) peak={} avg={} skipped={}",
        snapshot.total,
        rate.total,
        format_rate(rate.current),
        trend.glyph(),
        rate.trend_change,
        format_rate(rate.peak),
        format_rate(rate.average),
        state.skipped()
    )
}

/// Log a stats summary every `period` until shutdown
pub async fn run_headless(
    state: Arc<IngestState>,
    period: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick fires immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Shutdown initiated, stopping stats loop");
                break;
            }
            _ = interval.tick() => {
                info!("{}", stats_summary(&state));
            }
        }
    }
}
