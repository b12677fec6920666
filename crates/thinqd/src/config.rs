//! Configuration file parsing and structures.
//!
//! thinqd is configured with a single TOML file: logging, the optional HTTP
//! API and one section per native integration.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::filter::LevelFilter;

use crate::integrations::lge::LgeConfig;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP API; disabled when the section is absent
    #[serde(default)]
    pub api: Option<ApiConfig>,

    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"thinqd::integrations::lge" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the tracing filter: the global level plus one directive per override.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        let mut filter = EnvFilter::default().add_directive(LevelFilter::from(self.level).into());
        for (target, level) in &self.overrides {
            let directive: Directive = format!("{}={}", target, level.as_str())
                .parse()
                .map_err(|e| ConfigError::LogDirective(target.clone(), e))?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8565
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Integration configuration container
#[derive(Debug, Default, Deserialize)]
pub struct IntegrationsConfig {
    /// LG ThinQ air conditioners
    #[serde(default)]
    pub lge: Option<LgeConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let mut config: Config = toml::from_str(&contents)?;

        // Relative model info paths are resolved against the config file's directory
        if let (Some(lge), Some(base)) = (config.integrations.lge.as_mut(), path.as_ref().parent()) {
            lge.resolve_paths(base);
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid log override for '{0}': {1}")]
    LogDirective(String, #[source] tracing_subscriber::filter::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.api.is_none());
        assert!(config.integrations.lge.is_none());
    }

    #[test]
    fn test_parse_api_defaults() {
        let toml = r#"
            [logging]
            level = "debug"

            [api]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        let api = config.api.unwrap();
        assert_eq!(api.listen, "127.0.0.1");
        assert_eq!(api.port, 8565);
    }

    #[test]
    fn test_parse_lge_integration() {
        let toml = r#"
            [integrations.lge]
            api_base = "https://aic-service.lgthinq.com:46030/v1"
            access_token = "token"
            scan_interval_secs = 15

            [integrations.lge.devices.living_room]
            device_id = "a1b2c3"
            name = "Living Room AC"
            model = "RAC_056905_WW"
            model_info = "models/RAC_056905_WW.json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        let lge = config.integrations.lge.unwrap();
        assert!(lge.enabled);
        assert_eq!(lge.country, "US");
        assert_eq!(lge.scan_interval().as_secs(), 15);

        let device = &lge.devices["living_room"];
        assert_eq!(device.device_id, "a1b2c3");
        assert_eq!(device.model.as_deref(), Some("RAC_056905_WW"));
    }

    #[test]
    fn test_invalid_log_level() {
        let toml = r#"
            [logging]
            level = "loud"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_env_filter_overrides() {
        let mut logging = LoggingConfig::default();
        logging
            .overrides
            .insert("thinqd::integrations::lge".to_string(), LogLevel::Trace);
        logging
            .overrides
            .insert("tower_http".to_string(), LogLevel::Warn);
        assert!(logging.env_filter().is_ok());
    }
}
