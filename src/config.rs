//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - StoreConfig: Where the sensor_readings table lives and how to reach it.
//!     - ServerConfig: Address the dashboard listens on.
//!     - ChartConfig: Temperature pie maximum.
//!     - NotificationsConfig: How many recent notices to keep.
//!     - LoggingConfig: Log level and per-reading console output.
//!
//! environment:
//!     SUPABASE_URL and SUPABASE_ANON_KEY override store.url / store.api_key,
//!     so the key does not have to live in the file.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;

use crate::chart::DEFAULT_TEMPERATURE_MAX;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const API_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// project url, e.g. https://xyz.supabase.co
    pub url: String,
    pub api_key: String,
    pub table: String,
    /// 0 disables the poll fallback (webhook push only)
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub temperature_max: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    pub capacity: usize,
    /// how long a toast stays on the page after it was raised
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "sensor_readings".to_string(),
            poll_interval_seconds: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { temperature_max: DEFAULT_TEMPERATURE_MAX }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { capacity: 5, ttl_seconds: 4 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    /// Parse and validate a toml document
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: DashboardConfig = toml::from_str(content)
            .context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("dashboard.toml"),
            std::path::PathBuf::from("..").join("config").join("dashboard.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    /// Apply SUPABASE_URL / SUPABASE_ANON_KEY when set
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(URL_ENV).ok(), std::env::var(API_KEY_ENV).ok());
    }

    fn apply_overrides(&mut self, url: Option<String>, api_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.store.url = url;
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.store.api_key = key;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max = self.chart.temperature_max;
        if !max.is_finite() || max <= 0.0 {
            bail!("chart.temperature_max must be a positive number (got {})", max);
        }
        if self.store.table.trim().is_empty() {
            bail!("store.table must not be empty");
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let url = if self.store.url.is_empty() { "<unset>" } else { self.store.url.as_str() };
        println!("┌─────────────────────────────────────────┐");
        println!("│        DASHBOARD CONFIGURATION          │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Store: {}", url);
        println!("│ Table: {}", self.store.table);
        println!("│ Poll Interval: {}s", self.store.poll_interval_seconds);
        println!("│ Listen: {}", self.server.bind);
        println!("│ Temperature Max: {}°C", self.chart.temperature_max);
        println!("│ Toast TTL: {}s", self.notifications.ttl_seconds);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
