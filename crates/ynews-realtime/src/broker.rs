//! Publisher broker: ties the notification source to the subscriber
//! registry.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ynews_core::config::BrokerConfig;
use ynews_core::error::AppError;
use ynews_core::traits::NotificationSource;
use ynews_core::types::article::Article;

use crate::metrics::BrokerMetrics;
use crate::registry::{FanOutReport, SubscriberRegistry};
use crate::session::Subscription;

/// Owns the subscriber registry and runs the dispatch loop.
///
/// Cloning is cheap; clones share the registry, metrics and shutdown
/// signal.
#[derive(Debug, Clone)]
pub struct Broker {
    /// Subscriber registry.
    registry: Arc<SubscriberRegistry>,
    /// Metrics.
    metrics: Arc<BrokerMetrics>,
    /// Cancelled by [`Broker::stop`].
    shutdown: CancellationToken,
}

impl Broker {
    /// Creates a broker with an empty registry.
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new(config)),
            metrics: Arc::new(BrokerMetrics::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Opens a session for `user_id`; `None` if one already exists.
    pub async fn add_subscriber(&self, user_id: &str) -> Option<Subscription> {
        let subscription = self.registry.add(user_id).await;
        match subscription {
            Some(_) => self.metrics.session_opened(),
            None => self.metrics.duplicate_subscription(),
        }
        subscription
    }

    /// Closes the session for `user_id`, if any. Idempotent.
    pub async fn remove_subscriber(&self, user_id: &str) -> bool {
        let removed = self.registry.remove(user_id).await;
        if removed {
            self.metrics.session_closed();
        }
        removed
    }

    /// Handles one raw notification payload.
    ///
    /// Payloads that do not decode as an article are counted and returned
    /// as an error without touching any session.
    pub async fn dispatch(&self, payload: &str) -> Result<FanOutReport, AppError> {
        self.metrics.notification_received();

        let article = Article::from_notification(payload).map_err(|e| {
            self.metrics.malformed_payload();
            AppError::from(e)
        })?;

        Ok(self.publish(&article).await)
    }

    /// Fans an already decoded article out to every session.
    pub async fn publish(&self, article: &Article) -> FanOutReport {
        let report = self.registry.fan_out(article).await;
        self.metrics.record_fan_out(&report);

        debug!(
            title = %article.title,
            full = report.full,
            paywalled = report.paywalled,
            abandoned = report.abandoned,
            "Article dispatched"
        );
        report
    }

    /// Spawns the dispatch loop over `source`.
    ///
    /// The loop ends when [`Broker::stop`] is called or the source is
    /// exhausted. Pending notifications are not drained on stop.
    pub fn run<S: NotificationSource>(&self, source: S) -> JoinHandle<()> {
        let broker = self.clone();
        tokio::spawn(async move { broker.dispatch_loop(source).await })
    }

    async fn dispatch_loop<S: NotificationSource>(self, mut source: S) {
        info!("Broker dispatch loop started");

        loop {
            let payload = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Broker shutdown");
                    break;
                }
                payload = source.next_payload() => payload,
            };

            let Some(payload) = payload else {
                warn!("Notification source closed, dispatch loop exiting");
                break;
            };

            if let Err(e) = self.dispatch(&payload).await {
                warn!(error = %e, "Dropping undecodable article notification");
            }
        }
    }

    /// Signals the dispatch loop to exit. Safe to call repeatedly, and
    /// before [`Broker::run`].
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Whether [`Broker::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// The subscriber registry.
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Broker metrics.
    pub fn metrics(&self) -> &Arc<BrokerMetrics> {
        &self.metrics
    }
}
