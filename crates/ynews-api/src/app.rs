//! Service runners: wire configuration, database, broker and router
//! together and serve until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ynews_core::config::AppConfig;
use ynews_core::error::AppError;
use ynews_core::traits::SystemClock;
use ynews_database::{ArticleListener, ArticleRepository, DatabasePool, migration};
use ynews_realtime::Broker;

use crate::router::{build_aggregator_router, build_publisher_router};
use crate::state::{AggregatorState, PublisherState};

/// How long to wait for the dispatch loop after the server stops.
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the publisher until `shutdown` resolves.
///
/// Fails when the database is unreachable, migrations fail, `LISTEN` is
/// refused, or the address cannot be bound.
pub async fn run_publisher<F>(config: AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        version = env!("CARGO_PKG_VERSION"),
        initial_credits = config.broker.initial_credits,
        "Starting publisher"
    );

    let db = DatabasePool::connect(&config.database).await?;
    migration::run_migrations(db.pool()).await?;

    let listener = ArticleListener::connect(db.pool(), &config.listener).await?;

    let broker = Broker::new(&config.broker);
    let dispatch = broker.run(listener);

    let router = build_publisher_router(PublisherState::new(broker.clone()));
    let tcp = bind(&config.server.publisher_addr).await?;
    let served = serve(tcp, router, shutdown).await;

    broker.stop();
    if tokio::time::timeout(DISPATCH_DRAIN_TIMEOUT, dispatch)
        .await
        .is_err()
    {
        warn!("Dispatch loop did not stop in time");
    }
    db.close().await;

    info!("Publisher shut down");
    served
}

/// Runs the aggregator until `shutdown` resolves.
pub async fn run_aggregator<F>(config: AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(version = env!("CARGO_PKG_VERSION"), "Starting aggregator");

    let db = DatabasePool::connect(&config.database).await?;
    migration::run_migrations(db.pool()).await?;

    let repository = ArticleRepository::new(db.clone(), Arc::new(SystemClock));
    let router = build_aggregator_router(AggregatorState::new(Arc::new(repository)));

    let tcp = bind(&config.server.aggregator_addr).await?;
    let served = serve(tcp, router, shutdown).await;

    db.close().await;

    info!("Aggregator shut down");
    served
}

/// Binds a TCP listener on `addr`.
pub async fn bind(addr: &str) -> Result<TcpListener, AppError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        AppError::configuration(format!("Failed to bind {addr}: {e}"))
    })?;

    match listener.local_addr() {
        Ok(local) => info!(addr = %local, "Listening"),
        Err(_) => info!(addr = %addr, "Listening"),
    }
    Ok(listener)
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
