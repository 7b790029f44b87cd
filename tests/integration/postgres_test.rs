//! Storage and `LISTEN` path against a live PostgreSQL.
//!
//! Ignored by default. Point `YNEWS__DATABASE__*` at a scratch database and
//! run with `--ignored`.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;

use ynews_core::config::{AppConfig, BrokerConfig};
use ynews_core::traits::{ArticleStore, FixedClock};
use ynews_core::types::article::{ArticleDraft, PAYWALL_BODY};
use ynews_database::{ArticleListener, ArticleRepository, DatabasePool, migration};
use ynews_realtime::Broker;

use crate::helpers::TIMEOUT;

// Credits are spent on every notification, so tests that insert must not
// overlap.
static DB_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn database() -> (AppConfig, DatabasePool) {
    let config = AppConfig::load("config/default.toml").unwrap();
    let db = DatabasePool::connect(&config.database).await.unwrap();
    migration::run_migrations(db.pool()).await.unwrap();
    (config, db)
}

fn unique_category(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn draft(title: &str, body: &str, category: &str) -> ArticleDraft {
    ArticleDraft {
        title: title.to_string(),
        body: body.to_string(),
        category: category.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_repository_stores_clock_stamped_row() {
    let _guard = DB_LOCK.lock().await;
    let (_, db) = database().await;
    let stamp = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
    let repository = ArticleRepository::new(db.clone(), Arc::new(FixedClock(stamp)));
    let category = unique_category("store");

    repository.health_check().await.unwrap();
    let stored = repository
        .store(draft("title", "body", &category))
        .await
        .unwrap();
    assert_eq!(stored.published_at, stamp);

    let row: (String, String, DateTime<Utc>) = sqlx::query_as(
        "SELECT title, body, published_at FROM articles WHERE category = $1",
    )
    .bind(&category)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(row, ("title".to_string(), "body".to_string(), stamp));

    db.close().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_reaches_subscriber_through_listener() {
    let _guard = DB_LOCK.lock().await;
    let (config, db) = database().await;
    let stamp = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
    let repository = ArticleRepository::new(db.clone(), Arc::new(FixedClock(stamp)));
    let category = unique_category("listen");

    let listener = ArticleListener::connect(db.pool(), &config.listener)
        .await
        .unwrap();
    let broker = Broker::new(&BrokerConfig::with_initial_credits(1));
    let dispatch = broker.run(listener);
    let mut subscription = broker.add_subscriber("U1").await.unwrap();

    repository
        .store(draft("first", "full text", &category))
        .await
        .unwrap();
    repository
        .store(draft("second", "full text", &category))
        .await
        .unwrap();

    let first = tokio::time::timeout(TIMEOUT, subscription.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.title, "first");
    assert_eq!(first.body, "full text");
    assert_eq!(first.category, category);
    assert_eq!(first.published_at, stamp);

    let second = tokio::time::timeout(TIMEOUT, subscription.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.title, "second");
    assert_eq!(second.body, PAYWALL_BODY);

    broker.stop();
    drop(subscription);
    let _ = tokio::time::timeout(TIMEOUT, dispatch).await;
    db.close().await;
}
