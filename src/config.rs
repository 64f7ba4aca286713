//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/beer-tap/config.toml`).
//! Every section and key is optional; anything missing falls back to the
//! defaults below.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! shutdown_timeout = 30
//!
//! [database]
//! url = "sqlite://./beer_tap.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "text"   # or "json"
//!
//! [billing]
//! price_per_liter = "12.25"
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::infrastructure::database::DatabaseConfig;
use crate::shared::errors::InfraError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `beer_tap=debug,tower_http=info`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub price_per_liter: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            price_per_liter: Decimal::new(1225, 2),
        }
    }
}

/// `~/.config/beer-tap/config.toml`, or `./config.toml` when the platform
/// has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("beer-tap").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

impl AppConfig {
    /// Read and parse `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let cfg: Self =
            toml::from_str(raw).map_err(|e| InfraError::Config(format!("invalid TOML: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.billing.price_per_liter <= Decimal::ZERO {
            return Err(InfraError::Config(
                "billing.price_per_liter must be greater than 0".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(InfraError::Config("database.url must not be empty".to_string()));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(InfraError::Config(format!(
                "logging.format must be \"text\" or \"json\", got {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.address(), "0.0.0.0:8000");
        assert_eq!(cfg.server.shutdown_timeout, 30);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.billing.price_per_liter, Decimal::from_str("12.25").unwrap());
        assert!(cfg.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [database]
            url = "sqlite::memory:"

            [logging]
            format = "json"

            [billing]
            price_per_liter = "9.5"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.billing.price_per_liter, Decimal::from_str("9.5").unwrap());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_toml("[billing]\nprice_per_liter = \"0\"").is_err());
        assert!(AppConfig::from_toml("[logging]\nformat = \"xml\"").is_err());
        assert!(AppConfig::from_toml("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("beer-tap-does-not-exist").join("config.toml");
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("beer-tap/config.toml") || path.ends_with("config.toml"));
    }
}
