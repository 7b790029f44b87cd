//! Application state shared across handlers.

use std::sync::Arc;

use ynews_core::traits::ArticleStore;
use ynews_realtime::Broker;

/// State of the publisher service.
///
/// Passed to every handler via `State<PublisherState>`.
#[derive(Debug, Clone)]
pub struct PublisherState {
    /// The running broker
    pub broker: Broker,
}

impl PublisherState {
    /// Wrap a broker.
    pub fn new(broker: Broker) -> Self {
        Self { broker }
    }
}

/// State of the aggregator service.
#[derive(Debug, Clone)]
pub struct AggregatorState {
    /// Where submitted articles are persisted
    pub store: Arc<dyn ArticleStore>,
}

impl AggregatorState {
    /// Wrap an article store.
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }
}
