use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use tailnginx::args::Args;
use tailnginx::config::{Config, load_config_with_fallback};
use tailnginx::logging::init_logging;
use tailnginx::runtime::{
    build_runtime, open_geo_locator, resolve_log_path, run_headless, shutdown_signal,
    tail_options,
};
use tailnginx::tui::{self, LogBuffer, TuiApp};
use tailnginx::{IngestState, RateTracker, run_ingest, tail_lines, version};

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("{}", version::info());
        return Ok(());
    }

    let (mut config, source) = load_config_with_fallback(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let log_buffer = init_logging(args.no_tui, config.logging.file.as_deref());
    info!("tailnginx {}", version::short());
    info!("Loaded configuration from {}", source.description());

    // Resolved before the dashboard takes over the terminal so errors stay readable
    let log_path = resolve_log_path(&config)?;

    let rt = build_runtime()?;
    rt.block_on(run(config, log_path, args.no_tui, log_buffer))
}

async fn run(
    config: Config,
    log_path: PathBuf,
    headless: bool,
    log_buffer: Option<LogBuffer>,
) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let lines = tail_lines(
        log_path.clone(),
        tail_options(&config.tail),
        shutdown_tx.subscribe(),
    )
    .await
    .context("Failed to start tailing")?;

    let state = Arc::new(IngestState::new(RateTracker::new(
        config.rate.bucket,
        config.rate.window_size,
    )));
    let geo = Arc::new(open_geo_locator(&config));
    let ingest_handle = tokio::spawn(run_ingest(lines, state.clone(), geo));

    // Dashboard -> main when the user quits
    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
    // Main -> dashboard (or stats loop) on a signal
    let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

    let ui_handle = if headless {
        let period = config.refresh.get();
        tokio::spawn(async move {
            run_headless(state, period, stop_rx).await;
            drop(done_tx);
        })
    } else {
        let mut app = TuiApp::new(state, log_path, config.refresh);
        if let Some(log_buffer) = log_buffer {
            app = app.with_log_buffer(log_buffer);
        }
        tokio::spawn(async move {
            if let Err(e) = tui::run_tui(app, done_tx, stop_rx).await {
                error!("TUI error: {}", e);
            }
        })
    };

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            let _ = stop_tx.send(()).await;
        }
        _ = done_rx.recv() => {
            info!("Dashboard closed, shutting down");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = ui_handle.await;
    let _ = ingest_handle.await;

    info!("Shutdown complete");
    Ok(())
}
