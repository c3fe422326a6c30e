//! Configuration for the console client.
//!
//! Server URLs are user preferences and live in the persisted store
//! (see [`crate::preferences`]); this file only covers local process settings.

use config::{Config as ConfigLoader, ConfigError, Environment, File};

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JSON file backing the persisted client state.
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            typing: TypingConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Per-character delay range for the chat typing reveal.
#[derive(Debug, Clone, Deserialize)]
pub struct TypingConfig {
    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

// Default values
fn default_state_path() -> String {
    "console-state.json".to_string()
}
fn default_min_delay() -> u64 {
    15
}
fn default_max_delay() -> u64 {
    35
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (CONSOLE__SECTION__KEY format)
    /// 2. console.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        Self::build().map_err(|e| Error::Config(e.to_string()))
    }

    fn build() -> std::result::Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("state_path", default_state_path())?
            .set_default("typing.min_delay_ms", default_min_delay() as i64)?
            .set_default("typing.max_delay_ms", default_max_delay() as i64)?
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name("console").required(false))
            .add_source(
                Environment::with_prefix("CONSOLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
