//! End-to-end websocket tests against the real routers on ephemeral ports.

mod helpers;
mod postgres_test;
mod publish_test;
mod subscribe_test;
