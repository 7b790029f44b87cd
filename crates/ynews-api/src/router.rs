//! Route definitions for both services.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::{AggregatorState, PublisherState};

/// Publisher routes: `/subscribe` and `/health`.
pub fn build_publisher_router(state: PublisherState) -> Router {
    Router::new()
        .route("/subscribe", get(handlers::subscribe::subscribe))
        .route("/health", get(handlers::health::publisher_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Aggregator routes: `/publish` and `/health`.
pub fn build_aggregator_router(state: AggregatorState) -> Router {
    Router::new()
        .route("/publish", get(handlers::publish::publish))
        .route("/health", get(handlers::health::aggregator_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
