//! # ynews-realtime
//!
//! The publisher broker. Provides:
//!
//! - A subscriber registry enforcing one session per user
//! - Per-session bounded delivery channels with a credit balance
//! - The dispatch loop fanning each notified article out to every session,
//!   paywalling it for sessions without credits
//! - Broker metrics

pub mod broker;
pub mod metrics;
pub mod registry;
pub mod session;

pub use broker::Broker;
pub use metrics::{BrokerMetrics, MetricsSnapshot};
pub use registry::{FanOutReport, SubscriberRegistry};
pub use session::Subscription;
