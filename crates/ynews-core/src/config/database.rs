//! Database and change-notification listener configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// PostgreSQL connection parameters.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login role.
    #[serde(default = "default_credential")]
    pub user: String,
    /// Login password.
    #[serde(default = "default_credential")]
    pub password: String,
    /// Database name.
    #[serde(default = "default_credential")]
    pub name: String,
    /// libpq-style SSL mode (`disable`, `prefer`, `require`, ...).
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_credential(),
            password: default_credential(),
            name: default_credential(),
            ssl_mode: default_ssl_mode(),
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Connection acquire timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

// Keep the password out of logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} port={} user={} password=**** dbname={} sslmode={}",
            self.host, self.port, self.user, self.name, self.ssl_mode
        )
    }
}

/// Settings for the long-lived `LISTEN` connection.
///
/// The channel itself is fixed by the insert trigger
/// ([`ARTICLE_CHANNEL`](crate::types::article::ARTICLE_CHANNEL)); unknown
/// keys such as `channel` are rejected rather than silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// First reconnect delay after the connection drops, in seconds.
    #[serde(default = "default_min_reconnect")]
    pub min_reconnect_interval_seconds: u64,
    /// Upper bound for the reconnect delay, in seconds.
    #[serde(default = "default_max_reconnect")]
    pub max_reconnect_interval_seconds: u64,
    /// Payloads buffered between the listener task and the dispatch loop.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            min_reconnect_interval_seconds: default_min_reconnect(),
            max_reconnect_interval_seconds: default_max_reconnect(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl ListenerConfig {
    /// First reconnect delay.
    pub fn min_reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.min_reconnect_interval_seconds)
    }

    /// Reconnect delay cap.
    pub fn max_reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.max_reconnect_interval_seconds)
    }

    /// Reject zero buffers and inverted backoff bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.buffer_size == 0 {
            return Err(AppError::configuration(
                "listener.buffer_size must be greater than zero",
            ));
        }
        if self.min_reconnect_interval_seconds > self.max_reconnect_interval_seconds {
            return Err(AppError::configuration(format!(
                "listener.min_reconnect_interval_seconds ({}) exceeds max ({})",
                self.min_reconnect_interval_seconds, self.max_reconnect_interval_seconds
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "db".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_credential() -> String {
    "y".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_min_reconnect() -> u64 {
    10
}

fn default_max_reconnect() -> u64 {
    60
}

fn default_buffer_size() -> usize {
    64
}
