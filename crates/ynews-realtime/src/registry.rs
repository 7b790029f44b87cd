//! Subscriber registry: one session per user, guarded by a single mutex.
//!
//! `add`, `remove` and the fan-out critical section all take the same
//! lock, so a session is in the map exactly while its delivery channel is
//! open, and removal closes the channel exactly once.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use ynews_core::config::BrokerConfig;
use ynews_core::types::article::Article;

use crate::session::{SubscriberSession, Subscription};

/// Outcome of fanning one article out to every live session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    /// Sessions that received the full article.
    pub full: u64,
    /// Sessions that received the paywalled variant.
    pub paywalled: u64,
    /// Sessions whose handler left before the send completed.
    pub abandoned: u64,
}

impl FanOutReport {
    /// Number of completed deliveries.
    pub fn delivered(&self) -> u64 {
        self.full + self.paywalled
    }
}

/// In-memory mapping from user id to subscriber session.
#[derive(Debug)]
pub struct SubscriberRegistry {
    /// User ID → session.
    sessions: Mutex<HashMap<String, SubscriberSession>>,
    /// Credits granted to each new session.
    initial_credits: u32,
    /// Delivery channel capacity.
    channel_capacity: usize,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            initial_credits: config.initial_credits,
            channel_capacity: config.channel_capacity.max(1),
        }
    }

    /// Opens a session for `user_id`.
    ///
    /// Returns `None` if the user already has one; the existing session is
    /// left untouched.
    pub async fn add(&self, user_id: &str) -> Option<Subscription> {
        let mut sessions = self.sessions.lock().await;

        if sessions.contains_key(user_id) {
            warn!(user_id = %user_id, "Subscriber already has a session");
            return None;
        }

        let (session, subscription) =
            SubscriberSession::open(user_id, self.initial_credits, self.channel_capacity);
        sessions.insert(user_id.to_string(), session);

        info!(
            user_id = %user_id,
            balance = self.initial_credits,
            "Subscriber session opened"
        );
        Some(subscription)
    }

    /// Removes the session for `user_id`, closing its delivery channel.
    ///
    /// Returns whether a session was removed; calling it again is a no-op.
    pub async fn remove(&self, user_id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;

        match sessions.remove(user_id) {
            Some(session) => {
                drop(session);
                info!(user_id = %user_id, "Subscriber session closed");
                true
            }
            None => false,
        }
    }

    /// Delivers `article` to every session under the registry lock.
    ///
    /// Sessions with credits get the article verbatim and spend one credit;
    /// the rest get the paywalled variant. Each send waits for channel room,
    /// so a slow reader holds up the whole fan-out.
    pub async fn fan_out(&self, article: &Article) -> FanOutReport {
        let mut sessions = self.sessions.lock().await;
        let mut report = FanOutReport::default();

        for session in sessions.values_mut() {
            match session.deliver(article).await {
                Some(true) => report.full += 1,
                Some(false) => report.paywalled += 1,
                None => {
                    debug!(user_id = %session.user_id, "Subscriber left before delivery");
                    report.abandoned += 1;
                }
            }
        }

        report
    }

    /// Whether `user_id` currently has a session.
    pub async fn contains(&self, user_id: &str) -> bool {
        self.sessions.lock().await.contains_key(user_id)
    }

    /// Remaining credits of `user_id`'s session.
    pub async fn balance(&self, user_id: &str) -> Option<u32> {
        self.sessions
            .lock()
            .await
            .get(user_id)
            .map(SubscriberSession::balance)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Credits granted to each new session.
    pub fn initial_credits(&self) -> u32 {
        self.initial_credits
    }
}
