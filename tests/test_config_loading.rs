//! Tests for config loading
//!
//! Tests file loading, fallback logic and command-line overrides.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tailnginx::args::Args;
use tailnginx::config::{
    ConfigSource, create_default_config, load_config, load_config_with_fallback,
};
use tailnginx::types::RefreshRate;
use tempfile::NamedTempFile;

/// Test loading from TOML file
#[test]
fn test_load_config_from_file() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;

    let config_content = r#"
log_path = "/srv/www/logs/access.log"
refresh_ms = 250

[rate]
bucket_secs = 1
window_size = 300
"#;
    temp_file.write_all(config_content.as_bytes())?;
    temp_file.flush()?;

    let config = load_config(temp_file.path())?;

    assert_eq!(
        config.log_path.as_deref(),
        Some(Path::new("/srv/www/logs/access.log"))
    );
    assert_eq!(config.refresh.get(), Duration::from_millis(250));
    assert_eq!(config.rate.bucket, Duration::from_secs(1));
    assert_eq!(config.rate.window(), Duration::from_secs(300));

    Ok(())
}

/// Test invalid TOML returns error
#[test]
fn test_invalid_toml_returns_error() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(b"[rate\nbucket_secs = ")?;
    temp_file.flush()?;

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid config file"));

    Ok(())
}

/// Test missing file returns a read error
#[test]
fn test_missing_file_returns_error() {
    let err = load_config(Path::new("/nonexistent/tailnginx.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Test fallback to defaults when the file is absent
#[test]
fn test_fallback_to_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (config, source) = load_config_with_fallback(&dir.path().join("missing.toml"))?;

    assert_eq!(source, ConfigSource::Defaults);
    assert_eq!(source.description(), "built-in defaults");
    assert_eq!(config, create_default_config());

    Ok(())
}

/// Test fallback still reports a broken file
#[test]
fn test_fallback_propagates_parse_errors() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(b"[tail]\npoll_interval_ms = 0\n")?;
    temp_file.flush()?;

    assert!(load_config_with_fallback(temp_file.path()).is_err());

    Ok(())
}

/// Test the file source is reported
#[test]
fn test_fallback_reports_file_source() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(b"refresh_ms = 2000\n")?;
    temp_file.flush()?;

    let (config, source) = load_config_with_fallback(temp_file.path())?;
    assert_eq!(source, ConfigSource::File(temp_file.path().to_path_buf()));
    assert!(source.description().starts_with("config file"));
    assert_eq!(config.refresh.get(), Duration::from_secs(2));

    Ok(())
}

/// Test command-line flags override file values
#[test]
fn test_args_override_file() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(
        br#"
log_path = "/var/log/nginx/access.log"
refresh_ms = 3000

[geoip]
database = "/etc/geo.csv"
"#,
    )?;
    temp_file.flush()?;

    let mut config = load_config(temp_file.path())?;
    let args = Args::try_parse_from([
        "tailnginx",
        "--log",
        "/tmp/other.log",
        "--refresh",
        "200",
        "--from-end",
    ])?;
    args.apply(&mut config);

    assert_eq!(config.log_path.as_deref(), Some(Path::new("/tmp/other.log")));
    assert_eq!(config.refresh, RefreshRate::from_millis(200));
    assert!(config.tail.from_end);
    // Not given on the command line
    assert_eq!(config.geoip.database.as_deref(), Some(Path::new("/etc/geo.csv")));

    Ok(())
}

/// Test the default config serializes to TOML that loads back unchanged
#[test]
fn test_default_config_serializes() -> Result<()> {
    let text = toml::to_string(&create_default_config())?;
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(text.as_bytes())?;
    temp_file.flush()?;

    assert_eq!(load_config(temp_file.path())?, create_default_config());

    Ok(())
}
