//! Domain value types shared across the monitor
//!
//! Configuration values that must never be zero or out of range are wrapped in
//! newtypes so invalid settings are rejected when the config is deserialized.

pub mod config;

pub use config::{
    BacklogLines, ChannelCapacity, RefreshRate, WindowSize, duration_millis_serde,
    duration_secs_serde,
};
