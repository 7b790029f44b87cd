//! Shared test helpers for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use ynews_api::{AggregatorState, PublisherState, app};
use ynews_core::config::BrokerConfig;
use ynews_core::error::AppError;
use ynews_core::result::AppResult;
use ynews_core::traits::{ArticleStore, Clock};
use ynews_core::types::article::{Article, ArticleDraft};
use ynews_realtime::Broker;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A publisher served on an ephemeral port, fed from an in-memory
/// notification queue instead of PostgreSQL.
pub struct TestPublisher {
    pub addr: SocketAddr,
    pub broker: Broker,
    pub notify: mpsc::Sender<String>,
}

impl TestPublisher {
    pub async fn start(initial_credits: u32) -> Self {
        Self::start_with(BrokerConfig::with_initial_credits(initial_credits)).await
    }

    pub async fn start_with(config: BrokerConfig) -> Self {
        let broker = Broker::new(&config);
        let (notify, notifications) = mpsc::channel(64);
        let _dispatch = broker.run(notifications);

        let router = ynews_api::build_publisher_router(PublisherState::new(broker.clone()));
        let addr = spawn_server(router).await;

        Self {
            addr,
            broker,
            notify,
        }
    }

    /// Simulates `NOTIFY new_articles` with the given JSON payload.
    pub async fn notify(&self, payload: serde_json::Value) {
        self.notify.send(payload.to_string()).await.unwrap();
    }

    /// Opens `/subscribe`, optionally with a `Y-User-ID` header.
    pub async fn connect(&self, user_id: Option<&str>) -> Client {
        let mut request = format!("ws://{}/subscribe", self.addr)
            .into_client_request()
            .unwrap();
        if let Some(user_id) = user_id {
            request
                .headers_mut()
                .insert("Y-User-ID", HeaderValue::from_bytes(user_id.as_bytes()).unwrap());
        }
        let (client, _) = tokio_tungstenite::connect_async(request).await.unwrap();
        client
    }

    /// Connects and waits until the broker has registered the session.
    pub async fn subscribe(&self, user_id: &str) -> Client {
        let client = self.connect(Some(user_id)).await;
        let registry = self.broker.registry().clone();
        let user = user_id.to_string();
        wait_until(move || {
            let registry = registry.clone();
            let user = user.clone();
            async move { registry.contains(&user).await }
        })
        .await;
        client
    }
}

/// An aggregator served on an ephemeral port.
pub async fn start_aggregator(store: Arc<dyn ArticleStore>) -> SocketAddr {
    spawn_server(ynews_api::build_aggregator_router(AggregatorState::new(store))).await
}

pub async fn connect_publish(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/publish"))
        .await
        .unwrap();
    client
}

async fn spawn_server(router: axum::Router) -> SocketAddr {
    let listener = app::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(app::serve(listener, router, std::future::pending()));
    addr
}

/// Next text frame as JSON; panics on timeout, close, or end of stream.
pub async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Asserts the server closes the connection without sending more data.
pub async fn expect_closed(client: &mut Client) {
    loop {
        let frame = tokio::time::timeout(TIMEOUT, client.next())
            .await
            .expect("connection was not closed");
        match frame {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
        }
    }
}

pub async fn send_text(client: &mut Client, text: impl Into<String>) {
    let text: String = text.into();
    client.send(Message::Text(text.into())).await.unwrap();
}

/// Polls `check` until it returns true.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(TIMEOUT, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Article store that keeps everything in memory.
#[derive(Debug)]
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    pub stored: Mutex<Vec<Article>>,
}

impl MemoryStore {
    pub fn new(clock: impl Clock) -> Arc<Self> {
        Arc::new(Self {
            clock: Arc::new(clock),
            stored: Mutex::new(Vec::new()),
        })
    }

    pub fn stored(&self) -> Vec<Article> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn store(&self, draft: ArticleDraft) -> AppResult<Article> {
        let article = draft.publish(self.clock.now());
        self.stored.lock().unwrap().push(article.clone());
        Ok(article)
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Article store whose backend is always down.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl ArticleStore for FailingStore {
    async fn store(&self, _draft: ArticleDraft) -> AppResult<Article> {
        Err(AppError::database("connection refused"))
    }

    async fn health_check(&self) -> AppResult<()> {
        Err(AppError::service_unavailable("connection refused"))
    }
}
