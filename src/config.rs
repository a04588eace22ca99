//! Configuration loading and management.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no listen ports configured")]
    NoPorts,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity.
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Optional TLS configuration; when present, all listeners speak TLS.
    pub tls: Option<TlsConfig>,
    /// Optional on-disk storage locations.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Liveness timers.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "irc.example.net").
    pub name: String,
    /// Shared connection password. When set, clients must send PASS first.
    pub password: Option<String>,
    /// Path to the message-of-the-day file.
    pub motd_file: Option<PathBuf>,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Ports to bind on the wildcard address (e.g., [6667, 6668]).
    pub ports: Vec<u16>,
}

/// TLS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format).
    pub cert_path: String,
    /// Path to private key file (PEM format).
    pub key_path: String,
}

/// On-disk storage locations. Both are optional features.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted channel state (topic and key).
    pub state_dir: Option<PathBuf>,
    /// Directory for per-channel activity logs.
    pub log_dir: Option<PathBuf>,
}

/// Liveness timers, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// A connection is dropped after this much inactivity.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// After this much inactivity a registered client is sent a PING;
    /// an unregistered one is dropped outright.
    #[serde(default = "default_ping_after")]
    pub ping_after_secs: u64,
    /// Liveness check interval.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            ping_after_secs: default_ping_after(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    180
}

fn default_ping_after() -> u64 {
    90
}

fn default_sweep_interval() -> u64 {
    10
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.listen.ports.is_empty() {
            return Err(ConfigError::NoPorts);
        }
        Ok(config)
    }
}
