//! Configuration for the tutor services.
//!
//! Configuration lives in `~/.tutor/config.json`. Every section has
//! serde defaults so an empty or missing file yields a runnable local
//! setup (in-memory catalog, pretty logs, loopback bind).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".tutor"),
        |dirs| dirs.home_dir().join(".tutor"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" for structured JSON, "pretty" for human-readable
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Catalog backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the catalog service, e.g. "http://localhost:8000/chatbox".
    /// When unset the gateway falls back to the seeded in-memory catalog.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_backend_timeout(),
        }
    }
}

/// Gateway bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind host. Default is local only; set "0.0.0.0" for remote access.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    5055
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

/// Root configuration structure for the tutor services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Catalog backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable fallbacks.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TUTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(url) = std::env::var("TUTOR_BACKEND_URL") {
            self.backend.base_url = Some(url);
        }
        if let Ok(host) = std::env::var("TUTOR_GATEWAY_HOST") {
            self.gateway.host = host;
        }
        if let Ok(port) = std::env::var("TUTOR_GATEWAY_PORT") {
            if let Ok(p) = port.parse() {
                self.gateway.port = p;
            }
        }
    }

    /// Socket address string for the gateway.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.backend.base_url.is_none());
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.bind_address(), "127.0.0.1:5055");
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"backend": {{"base_url": "http://localhost:8000/chatbox"}}, "gateway": {{"port": 6001}}}}"#
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("http://localhost:8000/chatbox")
        );
        assert_eq!(config.gateway.port, 6001);
        // Untouched sections keep their defaults
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("TUTOR_GATEWAY_PORT", "7777");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.gateway.port, 7777);
        std::env::remove_var("TUTOR_GATEWAY_PORT");
    }
}
