// src/config.rs

//! Manages relay configuration: loading the optional TOML file, applying
//! defaults, and validation.
//!
//! This is the process-level configuration (where to listen, timeouts,
//! reconnect policy). The RCON target itself comes from the `.rconfig`
//! profiles in `config_dir`.

use crate::core::session::SessionOptions;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Timeouts for the RCON protocol client.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Applies to login and to every command round-trip.
    #[serde(default = "default_response_timeout", with = "humantime_serde")]
    pub response_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            response_timeout: default_response_timeout(),
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(cfg: &SessionConfig) -> Self {
        SessionOptions {
            connect_timeout: cfg.connect_timeout,
            response_timeout: cfg.response_timeout,
        }
    }
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_response_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Backoff policy for re-establishing a lost or failed session.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReconnectConfig {
    /// If false, only the initial connection attempt is made.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,
    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
    /// Consecutive failed attempts before giving up. `0` retries forever.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}
fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}
fn default_max_attempts() -> u32 {
    10
}

/// Bounds for the response ledger.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LedgerConfig {
    /// Maximum number of response events kept. `0` disables recording.
    #[serde(default = "default_ledger_capacity")]
    pub capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: default_ledger_capacity(),
        }
    }
}

fn default_ledger_capacity() -> usize {
    1024
}

/// Limits for the inventory scratch store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InventoryConfig {
    /// Largest accepted `inv` payload in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_max_payload_bytes() -> usize {
    64 * 1024
}

/// Configuration for the Prometheus endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, `GET /metrics` is served on the relay's HTTP listener.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

/// The relay configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory holding `config.rconfig` and the profile documents.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_config_dir() -> PathBuf {
    PathBuf::from("configuration")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            config_dir: default_config_dir(),
            session: SessionConfig::default(),
            reconnect: ReconnectConfig::default(),
            ledger: LedgerConfig::default(),
            inventory: InventoryConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{}'", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid configuration in '{}'", path.display()))
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists; otherwise falls back to defaults.
    ///
    /// `required` makes a missing file an error, for paths given explicitly.
    pub fn load(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() || required {
            Self::from_file(path)
        } else {
            warn!(
                "Config file '{}' not found. Using built-in defaults.",
                path.display()
            );
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.config_dir.as_os_str().is_empty() {
            return Err(anyhow!("config_dir cannot be empty"));
        }
        if self.session.connect_timeout.is_zero() {
            return Err(anyhow!("session.connect_timeout must be greater than 0"));
        }
        if self.session.response_timeout.is_zero() {
            return Err(anyhow!("session.response_timeout must be greater than 0"));
        }
        if self.reconnect.enabled {
            if self.reconnect.initial_delay.is_zero() {
                return Err(anyhow!("reconnect.initial_delay must be greater than 0"));
            }
            if self.reconnect.initial_delay > self.reconnect.max_delay {
                return Err(anyhow!(
                    "reconnect.initial_delay cannot exceed reconnect.max_delay"
                ));
            }
            if self.reconnect.max_attempts == 0 {
                warn!("reconnect.max_attempts is 0. The relay will retry the RCON server forever.");
            }
        }
        if self.inventory.max_payload_bytes == 0 {
            return Err(anyhow!("inventory.max_payload_bytes cannot be 0"));
        }
        if self.ledger.capacity == 0 {
            warn!("ledger.capacity is 0. Response events will not be recorded.");
        }
        Ok(())
    }
}
