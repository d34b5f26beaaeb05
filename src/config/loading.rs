//! Configuration loading from TOML files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::types::Config;

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file was present
    Defaults,
}

impl ConfigSource {
    /// Human-readable description for startup logs
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("config file '{}'", path.display()),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path).with_context(|| {
        format!("Failed to read config file '{}'", config_path.display())
    })?;

    parse_config(&config_content)
        .with_context(|| format!("Invalid config file '{}'", config_path.display()))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load the config file if it exists, otherwise use defaults
///
/// A file that exists but fails to parse is still an error.
pub fn load_config_with_fallback(config_path: &Path) -> Result<(Config, ConfigSource)> {
    if config_path.exists() {
        let config = load_config(config_path)?;
        return Ok((config, ConfigSource::File(config_path.to_path_buf())));
    }

    tracing::debug!(
        "Config file '{}' not found, using defaults",
        config_path.display()
    );
    Ok((create_default_config(), ConfigSource::Defaults))
}

/// Configuration with every field at its default
#[must_use]
pub fn create_default_config() -> Config {
    Config::default()
}
