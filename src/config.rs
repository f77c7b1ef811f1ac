//! Tripid configuration.
//!
//! Loaded from `~/.tripid/config.toml`. Every key is optional; a missing
//! file means all defaults.
//!
//! ```toml
//! log-level = "info"
//! storage-backend = "sqlite"
//! idle-speed-threshold-kmh = 5.0
//! position-timeout-secs = 10
//! fuel-efficiency-km-per-liter = 14.5
//! time-zone = "Europe/Copenhagen"
//!
//! [insights]
//! model = "gemini-2.0-flash"
//! api-key-env = "GEMINI_API_KEY"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jiff::tz::TimeZone;
use serde::Deserialize;

use crate::insights::{DEFAULT_ENDPOINT, DEFAULT_FUEL_EFFICIENCY, DEFAULT_MODEL};
use crate::position::{DEFAULT_TIMEOUT, WatchOptions};
use crate::storage::Backend;
use crate::tracker::{IDLE_SPEED_THRESHOLD_KMH, TrackerSettings};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Log filter used when `TRIPID_LOG` is not set.
    pub log_level: String,

    pub storage_backend: Backend,

    pub idle_speed_threshold_kmh: f64,

    /// Longest wait for the next position fix before the trip is ended.
    pub position_timeout_secs: u64,

    pub fuel_efficiency_km_per_liter: f64,

    /// IANA zone for trip names. The system zone when unset.
    pub time_zone: Option<String>,

    pub insights: InsightsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InsightsConfig {
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    pub endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            storage_backend: Backend::default(),
            idle_speed_threshold_kmh: IDLE_SPEED_THRESHOLD_KMH,
            position_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            fuel_efficiency_km_per_liter: DEFAULT_FUEL_EFFICIENCY,
            time_zone: None,
            insights: InsightsConfig::default(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Load config from `~/.tripid/config.toml`, or defaults if it does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;

        if config.idle_speed_threshold_kmh < 0.0 || !config.idle_speed_threshold_kmh.is_finite() {
            return Err("idle-speed-threshold-kmh must be zero or more".to_string());
        }
        if config.position_timeout_secs == 0 {
            return Err("position-timeout-secs must be at least 1".to_string());
        }
        config.time_zone()?;

        Ok(config)
    }

    /// The config file path: `~/.tripid/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::home().map(|h| h.join("config.toml"))
    }

    /// Where trip data lives: `~/.tripid/data/`.
    pub fn data_dir() -> Option<PathBuf> {
        Self::home().map(|h| h.join("data"))
    }

    fn home() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tripid"))
    }

    pub fn time_zone(&self) -> Result<TimeZone, String> {
        match &self.time_zone {
            Some(name) => {
                TimeZone::get(name).map_err(|e| format!("unknown time-zone '{name}': {e}"))
            }
            None => Ok(TimeZone::system()),
        }
    }

    pub fn tracker_settings(&self) -> Result<TrackerSettings, String> {
        Ok(TrackerSettings {
            idle_speed_threshold_kmh: self.idle_speed_threshold_kmh,
            watch: WatchOptions {
                timeout: Duration::from_secs(self.position_timeout_secs),
                ..WatchOptions::default()
            },
            time_zone: self.time_zone()?,
        })
    }
}
