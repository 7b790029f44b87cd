//! # ynews-database
//!
//! PostgreSQL connection management, schema migrations, the article
//! repository used by the aggregator, and the `LISTEN`-based notification
//! listener that feeds the publisher broker.

pub mod connection;
pub mod listener;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use listener::{ArticleListener, ListenerEvent, NotificationConnector, PgNotificationConnector};
pub use repositories::article::ArticleRepository;
