//! Source of raw change-notification payloads.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A stream of raw JSON payloads received on a named notification channel.
///
/// Reconnection, if any, is the implementation's business: consumers only
/// see payloads in the order the channel delivered them. `None` means the
/// source is exhausted and will never yield again.
#[async_trait]
pub trait NotificationSource: Send + 'static {
    /// Wait for the next payload.
    async fn next_payload(&mut self) -> Option<String>;
}

/// In-memory source: every string sent on the paired sender is yielded in
/// order, ending once all senders are dropped.
#[async_trait]
impl NotificationSource for mpsc::Receiver<String> {
    async fn next_payload(&mut self) -> Option<String> {
        self.recv().await
    }
}
