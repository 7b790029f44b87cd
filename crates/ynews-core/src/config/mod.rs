//! Application configuration schemas.
//!
//! Configuration is layered with the `config` crate: serde defaults, an
//! optional TOML file, `YNEWS__`-prefixed environment variables, and
//! finally explicit overrides (command-line flags).

pub mod app;
pub mod broker;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::broker::BrokerConfig;
pub use self::database::{DatabaseConfig, ListenerConfig};
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen addresses.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Change-notification listener settings.
    #[serde(default)]
    pub listener: ListenerConfig,
    /// Broker settings.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config_path` (optional) and the environment.
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        Self::load_with_overrides(config_path, std::iter::empty::<(&str, String)>())
    }

    /// Load configuration and apply `overrides` on top of every other source.
    ///
    /// Override keys use the dotted path of the field, e.g. `database.port`.
    pub fn load_with_overrides<K, I>(config_path: &str, overrides: I) -> Result<Self, AppError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, String)>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("YNEWS")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, value) in overrides {
            builder = builder
                .set_override(key.as_ref(), value)
                .map_err(|e| AppError::configuration(format!("Invalid override: {e}")))?;
        }

        let config: Self = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the services cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        self.server.validate()?;
        self.listener.validate()?;
        self.broker.validate()?;
        Ok(())
    }
}
