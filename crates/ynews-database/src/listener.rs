//! `LISTEN`-based change-notification listener.
//!
//! A dedicated task owns the listening connection and forwards each
//! notification payload, in arrival order, into a bounded queue. When the
//! connection drops, the task waits out a doubling backoff and reconnects;
//! notifications sent in the meantime are lost.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ynews_core::config::ListenerConfig;
use ynews_core::error::{AppError, ErrorKind};
use ynews_core::traits::NotificationSource;
use ynews_core::types::article::ARTICLE_CHANNEL;

/// Transport-level events reported by the listener task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerEvent {
    /// The initial connection is up and listening.
    Connected,
    /// The connection was lost.
    Disconnected,
    /// A lost connection was re-established and is listening again.
    Reconnected,
    /// A reconnect attempt failed; another follows after the backoff.
    ConnectionAttemptFailed,
}

impl fmt::Display for ListenerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Reconnected => write!(f, "reconnected"),
            Self::ConnectionAttemptFailed => write!(f, "connection_attempt_failed"),
        }
    }
}

/// Callback invoked from the listener task for every transport event.
pub type ListenerEventCallback = Arc<dyn Fn(ListenerEvent, Option<&sqlx::Error>) + Send + Sync>;

/// Default callback: log the event.
pub fn log_listener_event(event: ListenerEvent, err: Option<&sqlx::Error>) {
    match (event, err) {
        (ListenerEvent::Connected | ListenerEvent::Reconnected, _) => {
            info!(event = %event, "Notification listener connected");
        }
        (_, Some(e)) => warn!(event = %event, error = %e, "Notification listener problem"),
        (_, None) => warn!(event = %event, "Notification listener problem"),
    }
}

/// Opens listening connections and reads payloads from them.
///
/// `recv` yields `Ok(None)` when the server closed the connection.
#[async_trait]
pub trait NotificationConnector: Send + Sync + 'static {
    /// A connection that is already listening.
    type Connection: Send + 'static;

    /// Open a connection and start listening.
    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Wait for the next payload on `connection`.
    async fn recv(&self, connection: &mut Self::Connection)
    -> Result<Option<String>, sqlx::Error>;
}

/// PostgreSQL connector listening on [`ARTICLE_CHANNEL`].
#[derive(Debug, Clone)]
pub struct PgNotificationConnector {
    pool: PgPool,
}

impl PgNotificationConnector {
    /// Listen through connections opened with `pool`'s options.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationConnector for PgNotificationConnector {
    type Connection = PgListener;

    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(ARTICLE_CHANNEL).await?;
        Ok(listener)
    }

    async fn recv(&self, connection: &mut PgListener) -> Result<Option<String>, sqlx::Error> {
        let notification = connection.try_recv().await?;
        Ok(notification.map(|n| n.payload().to_string()))
    }
}

/// Doubling reconnect delay between a floor and a cap.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Start at `min`, never exceed `max`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            current: min,
        }
    }

    /// Delay to wait before the next attempt; doubles the following one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = delay.saturating_mul(2).min(self.max);
        delay
    }

    /// Return to the floor after a successful reconnect.
    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Handle to the listener task; yields raw payloads as a
/// [`NotificationSource`]. Dropping the handle stops the task.
pub struct ArticleListener {
    payloads: mpsc::Receiver<String>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl fmt::Debug for ArticleListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleListener")
            .field("running", &!self.task.is_finished())
            .finish()
    }
}

impl ArticleListener {
    /// Listen on [`ARTICLE_CHANNEL`] through `pool`, logging transport
    /// events.
    ///
    /// Fails when the initial connection or `LISTEN` fails.
    pub async fn connect(pool: &PgPool, config: &ListenerConfig) -> Result<Self, AppError> {
        Self::start(
            PgNotificationConnector::new(pool.clone()),
            config,
            Arc::new(log_listener_event),
        )
        .await
    }

    /// Open the first connection through `connector` and start the
    /// listener task, reporting transport events to `on_event`.
    pub async fn start<C: NotificationConnector>(
        connector: C,
        config: &ListenerConfig,
        on_event: ListenerEventCallback,
    ) -> Result<Self, AppError> {
        let connection = connector.connect().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to LISTEN on '{ARTICLE_CHANNEL}': {e}"),
                e,
            )
        })?;
        on_event(ListenerEvent::Connected, None);
        info!(channel = ARTICLE_CHANNEL, "Listening for article notifications");

        let (tx, payloads) = mpsc::channel(config.buffer_size.max(1));
        let cancel = CancellationToken::new();

        let worker = ListenerTask {
            connector,
            backoff: Backoff::new(
                config.min_reconnect_interval(),
                config.max_reconnect_interval(),
            ),
            on_event,
            tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run(connection));

        Ok(Self {
            payloads,
            cancel,
            task,
        })
    }
}

impl Drop for ArticleListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl NotificationSource for ArticleListener {
    async fn next_payload(&mut self) -> Option<String> {
        self.payloads.recv().await
    }
}

/// Outcome of one wait on the listening connection.
enum Step {
    Stop,
    Received(Result<Option<String>, sqlx::Error>),
}

struct ListenerTask<C: NotificationConnector> {
    connector: C,
    backoff: Backoff,
    on_event: ListenerEventCallback,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl<C: NotificationConnector> ListenerTask<C> {
    async fn run(mut self, initial: C::Connection) {
        let mut connection = Some(initial);

        loop {
            let listener = match connection.as_mut() {
                Some(listener) => listener,
                None => match self.reconnect().await {
                    Some(listener) => connection.insert(listener),
                    None => break,
                },
            };

            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Stop,
                received = self.connector.recv(listener) => Step::Received(received),
            };

            match step {
                Step::Stop => break,
                Step::Received(Ok(Some(payload))) => {
                    if !self.forward(payload).await {
                        break;
                    }
                }
                Step::Received(Ok(None)) => {
                    (self.on_event)(ListenerEvent::Disconnected, None);
                    connection = None;
                }
                Step::Received(Err(e)) => {
                    (self.on_event)(ListenerEvent::Disconnected, Some(&e));
                    connection = None;
                }
            }
        }

        debug!(channel = ARTICLE_CHANNEL, "Notification listener stopped");
    }

    /// Hand a payload to the consumer. `false` once the consumer is gone or
    /// the task is cancelled.
    async fn forward(&self, payload: String) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(payload) => match sent {
                Ok(()) => true,
                Err(_) => {
                    debug!("Notification consumer dropped");
                    false
                }
            },
        }
    }

    /// Retry until a listening connection is back, sleeping the backoff
    /// before every attempt. `None` when cancelled.
    async fn reconnect(&mut self) -> Option<C::Connection> {
        loop {
            let delay = self.backoff.next_delay();
            debug!(?delay, "Waiting before reconnect");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.connector.connect().await {
                Ok(connection) => {
                    self.backoff.reset();
                    (self.on_event)(ListenerEvent::Reconnected, None);
                    return Some(connection);
                }
                Err(e) => {
                    error!(channel = ARTICLE_CHANNEL, error = %e, "Reconnect attempt failed");
                    (self.on_event)(ListenerEvent::ConnectionAttemptFailed, Some(&e));
                }
            }
        }
    }
}
