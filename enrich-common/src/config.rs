//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file. Every key is optional and
//! falls back to a built-in default, so a missing default file never blocks
//! startup. Command-line and environment overrides are applied by the binary
//! on top of what is loaded here.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments / `ENRICH_*` environment variables
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Database location meaning "fresh in-memory database per process"
pub const MEMORY_DATABASE: &str = ":memory:";

/// Root configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:` for a database that resets on restart
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_DATABASE
    }
}

/// Background worker tuning
///
/// Durations are stored in milliseconds so they read naturally in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// How often the scheduler scans for due enrichments
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long an enrichment stays pending before it is promoted
    #[serde(default = "default_promotion_delay_ms")]
    pub promotion_delay_ms: u64,

    /// Probability that a single provider finds the requested value
    #[serde(default = "default_base_success_rate")]
    pub base_success_rate: f64,

    /// Probability used when the contact hint matches the known profile
    #[serde(default = "default_boosted_success_rate")]
    pub boosted_success_rate: f64,

    /// Lower bound of the simulated provider round trip
    #[serde(default = "default_latency_min_ms")]
    pub latency_min_ms: u64,

    /// Upper bound of the simulated provider round trip
    #[serde(default = "default_latency_max_ms")]
    pub latency_max_ms: u64,

    /// Lower bound of the simulated third-party profile lookup
    #[serde(default = "default_lookup_latency_min_ms")]
    pub lookup_latency_min_ms: u64,

    /// Upper bound of the simulated third-party profile lookup
    #[serde(default = "default_lookup_latency_max_ms")]
    pub lookup_latency_max_ms: u64,

    /// Fixed seed for reproducible runs; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            promotion_delay_ms: default_promotion_delay_ms(),
            base_success_rate: default_base_success_rate(),
            boosted_success_rate: default_boosted_success_rate(),
            latency_min_ms: default_latency_min_ms(),
            latency_max_ms: default_latency_max_ms(),
            lookup_latency_min_ms: default_lookup_latency_min_ms(),
            lookup_latency_max_ms: default_lookup_latency_max_ms(),
            seed: None,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn promotion_delay(&self) -> Duration {
        Duration::from_millis(self.promotion_delay_ms)
    }

    /// Simulated provider latency for a uniform sample `unit` in `[0, 1)`
    pub fn latency_for(&self, unit: f64) -> Duration {
        window_latency(self.latency_min_ms, self.latency_max_ms, unit)
    }

    /// Simulated third-party lookup latency for a uniform sample `unit`
    pub fn lookup_latency_for(&self, unit: f64) -> Duration {
        window_latency(self.lookup_latency_min_ms, self.lookup_latency_max_ms, unit)
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("base_success_rate", self.base_success_rate),
            ("boosted_success_rate", self.boosted_success_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Config(format!(
                    "worker.{} must be between 0 and 1, got {}",
                    name, rate
                )));
            }
        }

        for (prefix, min, max) in [
            ("latency", self.latency_min_ms, self.latency_max_ms),
            ("lookup_latency", self.lookup_latency_min_ms, self.lookup_latency_max_ms),
        ] {
            if min > max {
                return Err(Error::Config(format!(
                    "worker.{0}_min_ms ({1}) exceeds worker.{0}_max_ms ({2})",
                    prefix, min, max
                )));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "worker.poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn window_latency(min_ms: u64, max_ms: u64, unit: f64) -> Duration {
    let span = max_ms.saturating_sub(min_ms) as f64;
    let offset = (span * unit.clamp(0.0, 1.0)).round() as u64;
    Duration::from_millis(min_ms + offset.min(span as u64))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    MEMORY_DATABASE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_promotion_delay_ms() -> u64 {
    10_000
}

fn default_base_success_rate() -> f64 {
    0.2
}

fn default_boosted_success_rate() -> f64 {
    0.8
}

fn default_latency_min_ms() -> u64 {
    4_000
}

fn default_latency_max_ms() -> u64 {
    6_000
}

fn default_lookup_latency_min_ms() -> u64 {
    500
}

fn default_lookup_latency_max_ms() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    pub fn validate(&self) -> Result<()> {
        self.worker.validate()
    }
}

/// Platform config file location (`<config_dir>/enrich/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("enrich").join("config.toml"))
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Load configuration
///
/// An explicit path must exist. Without one, the platform default is used
/// when present and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = parse_config(&content)?;

    if config.database.is_memory() {
        warn!("Using in-memory database (data resets on restart, seed data always available)");
    }
    info!("Loaded configuration from {}", path.display());

    Ok(config)
}
