//! # Server Configuration
//!
//! Layered configuration loaded through the `config` crate.
//!
//! ## Precedence (last wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Built-in defaults      ServerConfig::default()                      │
//! │  2. mesha.toml             optional; path from MESHA_CONFIG             │
//! │  3. Environment            MESHA__PORT=8080                             │
//! │                            MESHA__DATABASE_PATH=/var/lib/mesha/mesha.db │
//! │                            MESHA__STORE__NAME="DUKA LA MAMA"            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::Path;

use config::{Config, Environment, File};
use mesha_core::receipt::{StoreProfile, DEFAULT_RECEIPT_WIDTH, MIN_RECEIPT_WIDTH};
use mesha_core::{DASHBOARD_LOW_STOCK_THRESHOLD, REPORT_LOW_STOCK_THRESHOLD};
use serde::{Deserialize, Serialize};

use crate::state::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_MINUTES};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "MESHA_CONFIG";

/// Configuration file used when `MESHA_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "mesha.toml";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// HTTP port.
    pub port: u16,

    /// SQLite database file, or `:memory:`.
    pub database_path: String,

    /// Connection pool size.
    pub max_connections: u32,

    /// Dashboard alert threshold (stock at or below).
    pub dashboard_low_stock_threshold: u32,

    /// Low-stock report threshold (stock at or below).
    pub report_low_stock_threshold: u32,

    /// chrono format of the Date column of sales reports.
    pub report_date_format: String,

    /// Character columns of the text receipt.
    pub receipt_width: usize,

    /// Shop details printed on receipts.
    pub store: StoreProfile,

    /// Cap on open cart sessions.
    pub max_sessions: usize,

    /// Minutes without use after which a cart session may be dropped.
    pub session_idle_minutes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: "mesha.db".to_string(),
            max_connections: 5,
            dashboard_low_stock_threshold: DASHBOARD_LOW_STOCK_THRESHOLD,
            report_low_stock_threshold: REPORT_LOW_STOCK_THRESHOLD,
            report_date_format: "%d/%m/%Y".to_string(),
            receipt_width: DEFAULT_RECEIPT_WIDTH,
            store: StoreProfile::default(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle_minutes: DEFAULT_SESSION_IDLE_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the config file, then `MESHA__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Like [`ServerConfig::load`] with an explicit file path.
    ///
    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&ServerConfig::default())?;

        let config: ServerConfig = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("MESHA").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks loaded values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                reason: "must not be 0".to_string(),
            });
        }

        if self.receipt_width < MIN_RECEIPT_WIDTH {
            return Err(ConfigError::InvalidValue {
                key: "receipt_width",
                reason: format!("must be at least {}", MIN_RECEIPT_WIDTH),
            });
        }

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                reason: "must not be empty".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_sessions",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.session_idle_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session_idle_minutes",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Idle time after which a cart session may be dropped.
    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_idle_minutes))
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "host",
                reason: format!("'{}' is not an IP address", self.host),
            })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dashboard_low_stock_threshold, 25);
        assert_eq!(config.report_low_stock_threshold, 10);
        assert_eq!(config.receipt_width, 42);
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
        assert_eq!(config.session_idle_timeout(), chrono::Duration::hours(8));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load_from(Path::new("/nonexistent/mesha.toml")).unwrap();
        assert_eq!(config.report_date_format, "%d/%m/%Y");
        assert_eq!(config.store, StoreProfile::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = env::temp_dir().join(format!("mesha-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
port = 8080
receipt_width = 48

[store]
name = "DUKA LA MAMA"
"#,
        )
        .unwrap();

        let config = ServerConfig::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.receipt_width, 48);
        assert_eq!(config.store.name, "DUKA LA MAMA");
        // untouched nested fields keep their defaults
        assert_eq!(config.store.pin, StoreProfile::default().pin);
        assert_eq!(config.dashboard_low_stock_threshold, 25);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "port", .. })
        ));

        let config = ServerConfig {
            receipt_width: 20,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "receipt_width", .. })
        ));

        let config = ServerConfig {
            session_idle_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                key: "session_idle_minutes",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_host_is_reported() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
