//! Listen address configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// HTTP/websocket listen addresses for both services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Publisher bind address (`/subscribe`).
    #[serde(default = "default_publisher_addr")]
    pub publisher_addr: String,
    /// Aggregator bind address (`/publish`).
    #[serde(default = "default_aggregator_addr")]
    pub aggregator_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            publisher_addr: default_publisher_addr(),
            aggregator_addr: default_aggregator_addr(),
        }
    }
}

impl ServerConfig {
    /// Both addresses must be `host:port`; the host may be a name.
    pub fn validate(&self) -> Result<(), AppError> {
        for addr in [&self.publisher_addr, &self.aggregator_addr] {
            if addr.parse::<SocketAddr>().is_ok() {
                continue;
            }
            let valid = addr
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(AppError::configuration(format!(
                    "Invalid listen address '{addr}': expected host:port"
                )));
            }
        }
        Ok(())
    }
}

fn default_publisher_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_aggregator_addr() -> String {
    "0.0.0.0:8080".to_string()
}
