//! `/publish` end-to-end behaviour.

use chrono::{TimeZone, Utc};
use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use ynews_core::traits::FixedClock;
use ynews_core::types::article::Article;

use crate::helpers::{
    FailingStore, MemoryStore, connect_publish, expect_closed, send_text, start_aggregator,
    wait_until,
};

#[tokio::test]
async fn test_articles_are_stamped_and_stored() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let store = MemoryStore::new(FixedClock(now));
    let addr = start_aggregator(store.clone()).await;
    let mut client = connect_publish(addr).await;

    send_text(
        &mut client,
        json!({"title": "One", "body": "First", "category": "world"}).to_string(),
    )
    .await;
    // a client-supplied timestamp is ignored
    send_text(
        &mut client,
        json!({
            "title": "Two",
            "body": "Second",
            "category": "sport",
            "published_at": "1999-01-01T00:00:00Z"
        })
        .to_string(),
    )
    .await;

    let observed = store.clone();
    wait_until(move || {
        let observed = observed.clone();
        async move { observed.stored().len() == 2 }
    })
    .await;

    assert_eq!(
        store.stored(),
        vec![
            Article::new("One", "First", "world", now),
            Article::new("Two", "Second", "sport", now),
        ]
    );
}

#[tokio::test]
async fn test_malformed_frame_closes_connection() {
    let store = MemoryStore::new(FixedClock(Utc::now()));
    let addr = start_aggregator(store.clone()).await;
    let mut client = connect_publish(addr).await;

    send_text(&mut client, "{not json").await;
    expect_closed(&mut client).await;
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn test_binary_frame_closes_connection() {
    let store = MemoryStore::new(FixedClock(Utc::now()));
    let addr = start_aggregator(store.clone()).await;
    let mut client = connect_publish(addr).await;

    client
        .send(Message::Binary(vec![1u8, 2, 3].into()))
        .await
        .unwrap();
    expect_closed(&mut client).await;
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn test_store_failure_closes_connection() {
    let addr = start_aggregator(std::sync::Arc::new(FailingStore)).await;
    let mut client = connect_publish(addr).await;

    send_text(
        &mut client,
        json!({"title": "t", "body": "b", "category": "c"}).to_string(),
    )
    .await;
    expect_closed(&mut client).await;
}

#[tokio::test]
async fn test_nothing_is_written_back() {
    let store = MemoryStore::new(FixedClock(Utc::now()));
    let addr = start_aggregator(store.clone()).await;
    let mut client = connect_publish(addr).await;

    send_text(
        &mut client,
        json!({"title": "t", "body": "b", "category": "c"}).to_string(),
    )
    .await;
    client.send(Message::Close(None)).await.unwrap();

    // only the closing handshake comes back
    expect_closed(&mut client).await;
    assert_eq!(store.stored().len(), 1);
}
