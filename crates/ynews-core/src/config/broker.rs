//! Broker configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Subscriber session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Full-content deliveries granted to every new session.
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u32,
    /// Capacity of each session's delivery channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            initial_credits: default_initial_credits(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl BrokerConfig {
    /// Build a config with the given credit grant and default capacity.
    pub fn with_initial_credits(initial_credits: u32) -> Self {
        Self {
            initial_credits,
            ..Self::default()
        }
    }

    /// Delivery channels need room for at least one article.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.channel_capacity == 0 {
            return Err(AppError::configuration(
                "broker.channel_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_initial_credits() -> u32 {
    10
}

fn default_channel_capacity() -> usize {
    10
}
