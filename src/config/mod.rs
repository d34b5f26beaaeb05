//! Configuration module
//!
//! Settings come from an optional TOML file; command-line flags override
//! individual values (see [`crate::args::Args::apply`]).

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ConfigSource, create_default_config, load_config, load_config_with_fallback, parse_config,
};
pub use types::{Config, GeoIpConfig, LoggingConfig, RateConfig, TailConfig};

pub use defaults::{CONFIG_FILE, bucket_duration, poll_interval};
