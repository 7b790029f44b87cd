//! # ynews-api
//!
//! HTTP and websocket layer for Y News built on Axum.
//!
//! The publisher serves `/subscribe`, streaming articles from the broker to
//! one websocket per user. The aggregator serves `/publish`, storing every
//! article frame a journalist sends. Both expose `/health`.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{run_aggregator, run_publisher};
pub use router::{build_aggregator_router, build_publisher_router};
pub use state::{AggregatorState, PublisherState};
