//! Broker metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::registry::FanOutReport;

/// Broker-level counters.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    /// Notifications taken off the source
    pub notifications_received: AtomicU64,
    /// Notifications dropped because they did not decode
    pub malformed_payloads: AtomicU64,
    /// Full articles delivered
    pub full_deliveries: AtomicU64,
    /// Paywalled articles delivered
    pub paywalled_deliveries: AtomicU64,
    /// Sends abandoned because the subscriber left
    pub abandoned_deliveries: AtomicU64,
    /// Sessions opened
    pub sessions_opened: AtomicU64,
    /// Sessions closed
    pub sessions_closed: AtomicU64,
    /// Subscribe attempts refused as duplicates
    pub duplicate_subscriptions: AtomicU64,
}

impl BrokerMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an incoming notification
    pub fn notification_received(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a payload that failed to decode
    pub fn malformed_payload(&self) {
        self.malformed_payloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Add one fan-out's outcome
    pub fn record_fan_out(&self, report: &FanOutReport) {
        self.full_deliveries
            .fetch_add(report.full, Ordering::Relaxed);
        self.paywalled_deliveries
            .fetch_add(report.paywalled, Ordering::Relaxed);
        self.abandoned_deliveries
            .fetch_add(report.abandoned, Ordering::Relaxed);
    }

    /// Count an opened session
    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a closed session
    pub fn session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a refused duplicate subscription
    pub fn duplicate_subscription(&self) {
        self.duplicate_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            malformed_payloads: self.malformed_payloads.load(Ordering::Relaxed),
            full_deliveries: self.full_deliveries.load(Ordering::Relaxed),
            paywalled_deliveries: self.paywalled_deliveries.load(Ordering::Relaxed),
            abandoned_deliveries: self.abandoned_deliveries.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            duplicate_subscriptions: self.duplicate_subscriptions.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Notifications taken off the source
    pub notifications_received: u64,
    /// Notifications dropped because they did not decode
    pub malformed_payloads: u64,
    /// Full articles delivered
    pub full_deliveries: u64,
    /// Paywalled articles delivered
    pub paywalled_deliveries: u64,
    /// Sends abandoned because the subscriber left
    pub abandoned_deliveries: u64,
    /// Sessions opened
    pub sessions_opened: u64,
    /// Sessions closed
    pub sessions_closed: u64,
    /// Subscribe attempts refused as duplicates
    pub duplicate_subscriptions: u64,
}
