//! Main application configuration
//!
//! This module defines the configuration structures for the raid-queue
//! estimator, including environment variable and TOML file loading and
//! validation.

use crate::estimate::calculator::EstimatorConfig;
use crate::estimate::status::StatusFormatter;
use crate::persistence::store::DEFAULT_STORE_KEY;
use crate::utils::{ClockStyle, DisplayZone};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub estimator: EstimatorConfig,
    pub storage: StorageSettings,
    pub display: DisplaySettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name used in log output
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Where estimator state is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the state file; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// Name of the state blob
    pub key: String,
}

/// Status rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Status refresh period while a queue is active
    pub refresh_interval_ms: u64,
    pub clock_style: ClockStyle,
    pub zone: DisplayZone,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "raid-queue".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000, // 1 second
            clock_style: ClockStyle::TwelveHour,
            zone: DisplayZone::Local,
        }
    }
}

impl DisplaySettings {
    pub fn formatter(&self) -> StatusFormatter {
        StatusFormatter::new(self.clock_style, self.zone)
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.apply_overrides(|key| env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Apply `RAID_QUEUE_*` overrides from the given lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = lookup("RAID_QUEUE_SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = lookup("RAID_QUEUE_LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Storage settings
        if let Some(dir) = lookup("RAID_QUEUE_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(key) = lookup("RAID_QUEUE_STORE_KEY") {
            self.storage.key = key;
        }

        // Estimator settings
        if let Some(value) = lookup("RAID_QUEUE_DEFAULT_PER_UNIT_SECONDS") {
            self.estimator.default_per_unit_seconds = value.parse().map_err(|_| {
                anyhow!("Invalid RAID_QUEUE_DEFAULT_PER_UNIT_SECONDS value: {}", value)
            })?;
        }
        if let Some(value) = lookup("RAID_QUEUE_MIN_PER_UNIT_SECONDS") {
            self.estimator.min_per_unit_seconds = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_MIN_PER_UNIT_SECONDS value: {}", value))?;
        }
        if let Some(value) = lookup("RAID_QUEUE_MAX_PER_UNIT_SECONDS") {
            self.estimator.max_per_unit_seconds = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_MAX_PER_UNIT_SECONDS value: {}", value))?;
        }
        if let Some(value) = lookup("RAID_QUEUE_RECENT_WEIGHT") {
            self.estimator.recent_weight = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_RECENT_WEIGHT value: {}", value))?;
        }
        if let Some(value) = lookup("RAID_QUEUE_TRACK_BOSS_HISTORY") {
            self.estimator.track_boss_history = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_TRACK_BOSS_HISTORY value: {}", value))?;
        }

        // Display settings
        if let Some(value) = lookup("RAID_QUEUE_REFRESH_INTERVAL_MS") {
            self.display.refresh_interval_ms = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_REFRESH_INTERVAL_MS value: {}", value))?;
        }
        if let Some(value) = lookup("RAID_QUEUE_CLOCK_STYLE") {
            self.display.clock_style = match value.to_lowercase().as_str() {
                "12h" | "twelve_hour" => ClockStyle::TwelveHour,
                "24h" | "twenty_four_hour" => ClockStyle::TwentyFourHour,
                _ => return Err(anyhow!("Invalid RAID_QUEUE_CLOCK_STYLE value: {}", value)),
            };
        }
        if let Some(value) = lookup("RAID_QUEUE_DISPLAY_UTC") {
            let utc: bool = value
                .parse()
                .map_err(|_| anyhow!("Invalid RAID_QUEUE_DISPLAY_UTC value: {}", value))?;
            self.display.zone = if utc {
                DisplayZone::Utc
            } else {
                DisplayZone::Local
            };
        }

        Ok(())
    }

    /// Get the status refresh period as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.display.refresh_interval_ms)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate storage settings
    if config.storage.key.trim().is_empty() {
        return Err(anyhow!("Store key cannot be empty"));
    }

    // Validate display settings
    if config.display.refresh_interval_ms == 0 {
        return Err(anyhow!("Refresh interval must be greater than 0"));
    }

    config.estimator.validate()?;

    Ok(())
}
