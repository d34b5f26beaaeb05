//! Command-line argument parsing
//!
//! Every flag can also be set through a `TAILNGINX_*` environment variable.
//! Values given here override the config file.

use crate::config::{CONFIG_FILE, Config};
use crate::types::RefreshRate;
use clap::Parser;
use std::path::PathBuf;

/// Parse a refresh interval in milliseconds, clamping it into range
fn parse_refresh(s: &str) -> Result<RefreshRate, String> {
    let millis: u64 = s
        .parse()
        .map_err(|e| format!("Invalid refresh interval: {}", e))?;
    Ok(RefreshRate::from_millis(millis))
}

/// Real-time nginx access log monitor
#[derive(Parser, Debug, Clone)]
#[command(name = "tailnginx", about, disable_version_flag = true)]
pub struct Args {
    /// Path to the nginx access log (auto-detected when omitted)
    #[arg(short, long, env = "TAILNGINX_LOG")]
    pub log: Option<PathBuf>,

    /// Refresh interval in milliseconds (100-10000)
    #[arg(short, long, env = "TAILNGINX_REFRESH", value_parser = parse_refresh)]
    pub refresh: Option<RefreshRate>,

    /// Configuration file path
    #[arg(short, long, default_value = CONFIG_FILE, env = "TAILNGINX_CONFIG")]
    pub config: PathBuf,

    /// Only show requests logged after startup
    #[arg(long, env = "TAILNGINX_FROM_END")]
    pub from_end: bool,

    /// CSV GeoIP range database (start_ip,end_ip,country_code)
    #[arg(long, env = "TAILNGINX_GEOIP_DB")]
    pub geoip_db: Option<PathBuf>,

    /// Log statistics to stdout instead of showing the dashboard
    #[arg(long, env = "TAILNGINX_NO_TUI")]
    pub no_tui: bool,

    /// Print version information and exit
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Args {
    /// Override config file values with the ones given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(log) = &self.log {
            config.log_path = Some(log.clone());
        }
        if let Some(refresh) = self.refresh {
            config.refresh = refresh;
        }
        if self.from_end {
            config.tail.from_end = true;
        }
        if let Some(db) = &self.geoip_db {
            config.geoip.database = Some(db.clone());
        }
    }
}
