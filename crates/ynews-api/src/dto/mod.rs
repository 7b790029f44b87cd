//! Wire DTOs that are not part of the article model.

use serde::{Deserialize, Serialize};

use ynews_realtime::MetricsSnapshot;

/// Sent on `/subscribe` when a user id is missing.
pub const USER_ID_NOT_FOUND: &str = "User id not found";

/// Sent on `/subscribe` when the user is already connected.
pub const ALREADY_SUBSCRIBED: &str = "Upgrade to premium to use Y network from multiple devices";

/// Error frame written to a websocket before it is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    /// Human-readable reason.
    pub error: String,
}

impl ErrorFrame {
    /// Creates an error frame.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// `publisher` or `aggregator`.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// Live subscriber sessions (publisher only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<usize>,
    /// Broker counters (publisher only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

impl HealthResponse {
    /// Healthy response for `service` with no broker details.
    pub fn ok(service: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            subscribers: None,
            metrics: None,
        }
    }
}
