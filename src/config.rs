//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DatasourceSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend datasource settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_name() -> String {
    "metricbridge".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for DatasourceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_name(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("metricbridge").join("config.toml")),
            Some(PathBuf::from("/etc/metricbridge/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("METRICBRIDGE_BASE_URL") {
            self.datasource.base_url = base_url;
        }
        if let Ok(name) = std::env::var("METRICBRIDGE_NAME") {
            self.datasource.name = name;
        }
        if let Ok(timeout) = std::env::var("METRICBRIDGE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.datasource.request_timeout_ms = ms;
            }
        }

        if let Ok(level) = std::env::var("METRICBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("METRICBRIDGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Metricbridge Configuration
#
# Environment variables override these settings:
# - METRICBRIDGE_BASE_URL
# - METRICBRIDGE_NAME
# - METRICBRIDGE_TIMEOUT_MS
# - METRICBRIDGE_LOG_LEVEL
# - METRICBRIDGE_LOG_FORMAT

[datasource]
# Base URL of the backend's dashboard API
base_url = "http://localhost:8080"

# Display name of this datasource instance
name = "metricbridge"

# Request timeout (ms)
request_timeout_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.datasource.base_url, "http://localhost:8080");
        assert_eq!(config.datasource.request_timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[datasource]\nbase_url = \"http://backend:9090\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.datasource.base_url, "http://backend:9090");
        // Unspecified fields keep their defaults.
        assert_eq!(config.datasource.name, "metricbridge");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[datasource\nbase_url =").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    // Sole test touching the METRICBRIDGE_* variables, so parallel test
    // threads cannot observe a half-set environment.
    #[test]
    fn test_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[datasource]\nbase_url = \"http://backend:9090\"\nname = \"filed\""
        )
        .unwrap();

        std::env::set_var("METRICBRIDGE_BASE_URL", "http://override:7070");
        std::env::set_var("METRICBRIDGE_TIMEOUT_MS", "250");
        std::env::set_var("METRICBRIDGE_LOG_LEVEL", "trace");

        let from_file = Config::load_with_env(file.path()).unwrap();
        let env_only = Config::from_env();

        std::env::remove_var("METRICBRIDGE_BASE_URL");
        std::env::remove_var("METRICBRIDGE_TIMEOUT_MS");
        std::env::remove_var("METRICBRIDGE_LOG_LEVEL");

        // Environment wins over the file; untouched file values survive.
        assert_eq!(from_file.datasource.base_url, "http://override:7070");
        assert_eq!(from_file.datasource.request_timeout_ms, 250);
        assert_eq!(from_file.datasource.name, "filed");
        assert_eq!(from_file.logging.level, "trace");

        // Environment wins over the defaults.
        assert_eq!(env_only.datasource.base_url, "http://override:7070");
        assert_eq!(env_only.datasource.name, "metricbridge");
        assert_eq!(env_only.logging.level, "trace");
    }

    #[test]
    fn test_generated_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.datasource.base_url, "http://localhost:8080");
    }
}
