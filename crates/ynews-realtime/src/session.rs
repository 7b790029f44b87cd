//! Subscriber session state and the handler-side subscription handle.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ynews_core::types::article::Article;

/// Broker-side state of one subscriber.
///
/// Owned by the registry. Dropping it drops the only sender, which closes
/// the delivery channel.
#[derive(Debug)]
pub struct SubscriberSession {
    /// User owning the session
    pub user_id: String,
    /// Send end of the delivery channel
    sender: mpsc::Sender<Article>,
    /// Remaining full-content deliveries
    balance: u32,
    /// Cancelled once the handler stops reading
    departed: CancellationToken,
}

impl SubscriberSession {
    /// Create a session and the subscription handed to its connection handler.
    pub(crate) fn open(user_id: &str, balance: u32, capacity: usize) -> (Self, Subscription) {
        let (sender, receiver) = mpsc::channel(capacity);
        let departed = CancellationToken::new();

        let session = Self {
            user_id: user_id.to_string(),
            sender,
            balance,
            departed: departed.clone(),
        };
        let subscription = Subscription {
            articles: receiver,
            departed,
        };

        (session, subscription)
    }

    /// Remaining credits.
    pub fn balance(&self) -> u32 {
        self.balance
    }

    /// Enqueue the article this session is entitled to.
    ///
    /// Waits for room in the channel. Returns `None` if the handler departed
    /// or dropped its receiver first; otherwise whether the delivered copy
    /// was the full article. Credits are only spent on completed sends.
    pub(crate) async fn deliver(&mut self, article: &Article) -> Option<bool> {
        let full = self.balance > 0;
        let delivery = if full {
            article.clone()
        } else {
            article.paywalled()
        };

        let sent = tokio::select! {
            biased;
            _ = self.departed.cancelled() => false,
            sent = self.sender.send(delivery) => sent.is_ok(),
        };

        if !sent {
            return None;
        }
        if full {
            self.balance -= 1;
        }
        Some(full)
    }
}

/// Handler-side end of a session: the delivery channel's receive end.
///
/// Dropping the subscription marks the session departed so fan-out never
/// waits on a reader that is gone.
#[derive(Debug)]
pub struct Subscription {
    articles: mpsc::Receiver<Article>,
    departed: CancellationToken,
}

impl Subscription {
    /// Next delivered article; `None` once the session has been removed and
    /// everything queued before removal has been read.
    pub async fn recv(&mut self) -> Option<Article> {
        self.articles.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<Article> {
        self.articles.try_recv().ok()
    }

    /// Signal that nothing will be read from this subscription any more.
    pub fn depart(&self) {
        self.departed.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.departed.cancel();
    }
}
