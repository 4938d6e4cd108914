//! Configuration management for discord-gifs.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults filled in for missing keys on load
//!
//! # Example
//!
//! ```no_run
//! use dgif_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Default fps: {}", config.settings().encoding.default_fps);
//!
//! config.settings_mut().tools.prefer_gifski = false;
//! config.update_section(ConfigSection::Tools).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodingSettings, LimitSettings, LoggingSettings, PathSettings, Settings,
    ToolSettings,
};
