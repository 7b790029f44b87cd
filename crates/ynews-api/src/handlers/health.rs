//! Health check handlers.

use axum::Json;
use axum::extract::State;

use ynews_core::error::AppError;

use crate::dto::HealthResponse;
use crate::state::{AggregatorState, PublisherState};

/// GET /health on the publisher
pub async fn publisher_health(State(state): State<PublisherState>) -> Json<HealthResponse> {
    let broker = &state.broker;

    Json(HealthResponse {
        subscribers: Some(broker.registry().len().await),
        metrics: Some(broker.metrics().snapshot()),
        ..HealthResponse::ok("publisher")
    })
}

/// GET /health on the aggregator; 503 while the database is unreachable
pub async fn aggregator_health(
    State(state): State<AggregatorState>,
) -> Result<Json<HealthResponse>, AppError> {
    state.store.health_check().await?;
    Ok(Json(HealthResponse::ok("aggregator")))
}
