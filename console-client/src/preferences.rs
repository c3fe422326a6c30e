//! User preferences persisted in the key-value store.
//!
//! Each preference is stored as a primitive under its own key. A missing or
//! unparseable value reads as the default.

use std::str::FromStr;

use crate::error::Result;
use crate::gateway::DEFAULT_SERVER_URL;
use crate::metrics::DEFAULT_METRICS_URL;
use crate::store::KeyValueStore;

pub const SERVER_URL_KEY: &str = "serverUrl";
pub const METRICS_URL_KEY: &str = "metricsServerUrl";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const AUTO_REFRESH_KEY: &str = "autoRefresh";
pub const REFRESH_INTERVAL_KEY: &str = "refreshInterval";

pub const MIN_REFRESH_INTERVAL_SECS: u32 = 1;
pub const MAX_REFRESH_INTERVAL_SECS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Inference server base URL.
    pub server_url: String,
    /// Metrics server base URL.
    pub metrics_url: String,
    pub dark_mode: bool,
    /// Whether dashboards poll for fresh metrics.
    pub auto_refresh: bool,
    /// Polling period, 1..=60 seconds.
    pub refresh_interval_secs: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            dark_mode: false,
            auto_refresh: true,
            refresh_interval_secs: 5,
        }
    }
}

impl Preferences {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            server_url: read_url(store, SERVER_URL_KEY)?.unwrap_or(defaults.server_url),
            metrics_url: read_url(store, METRICS_URL_KEY)?.unwrap_or(defaults.metrics_url),
            dark_mode: read_parsed(store, DARK_MODE_KEY)?.unwrap_or(defaults.dark_mode),
            auto_refresh: read_parsed(store, AUTO_REFRESH_KEY)?.unwrap_or(defaults.auto_refresh),
            refresh_interval_secs: read_parsed(store, REFRESH_INTERVAL_KEY)?
                .map(clamp_interval)
                .unwrap_or(defaults.refresh_interval_secs),
        })
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(SERVER_URL_KEY, &self.server_url)?;
        store.set(METRICS_URL_KEY, &self.metrics_url)?;
        store.set(DARK_MODE_KEY, &self.dark_mode.to_string())?;
        store.set(AUTO_REFRESH_KEY, &self.auto_refresh.to_string())?;
        store.set(
            REFRESH_INTERVAL_KEY,
            &clamp_interval(self.refresh_interval_secs).to_string(),
        )
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(clamp_interval(self.refresh_interval_secs)))
    }

    /// Apply a `key=value` style update using the stored key names.
    ///
    /// Returns `false` if the key is unknown or the value does not parse.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        match key {
            SERVER_URL_KEY if !value.is_empty() => self.server_url = value.to_string(),
            METRICS_URL_KEY if !value.is_empty() => self.metrics_url = value.to_string(),
            DARK_MODE_KEY => match value.parse() {
                Ok(v) => self.dark_mode = v,
                Err(_) => return false,
            },
            AUTO_REFRESH_KEY => match value.parse() {
                Ok(v) => self.auto_refresh = v,
                Err(_) => return false,
            },
            REFRESH_INTERVAL_KEY => match value.parse() {
                Ok(v) => self.refresh_interval_secs = clamp_interval(v),
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }
}

fn clamp_interval(secs: u32) -> u32 {
    secs.clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS)
}

fn read_url(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>> {
    Ok(store
        .get(key)?
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn read_parsed<T: FromStr>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            tracing::warn!("Ignoring unparseable preference {}={:?}", key, raw);
            Ok(None)
        }
    }
}
