//! `/subscribe` end-to-end behaviour.

use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use crate::helpers::{TestPublisher, expect_closed, next_json, wait_until};

fn article(title: &str, body: &str, category: &str, published_at: &str) -> serde_json::Value {
    json!({
        "title": title,
        "body": body,
        "category": category,
        "published_at": published_at,
    })
}

#[tokio::test]
async fn test_credits_then_paywall() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.subscribe("U1").await;

    publisher
        .notify(article("title", "body", "category", "2020-01-01T12:00:00Z"))
        .await;
    assert_eq!(
        next_json(&mut client).await,
        article("title", "body", "category", "2020-01-01T12:00:00Z")
    );

    publisher
        .notify(article(
            "Full Title",
            "Full Body",
            "Full Category",
            "2020-01-01T12:00:00Z",
        ))
        .await;
    assert_eq!(
        next_json(&mut client).await,
        article(
            "Full Title",
            "Top up your account to read the full content",
            "Full Category",
            "2020-01-01T12:00:00Z"
        )
    );
}

#[tokio::test]
async fn test_second_device_is_refused() {
    let publisher = TestPublisher::start(5).await;
    let mut first = publisher.subscribe("U1").await;

    let mut second = publisher.connect(Some("U1")).await;
    assert_eq!(
        next_json(&mut second).await,
        json!({"error": "Upgrade to premium to use Y network from multiple devices"})
    );
    expect_closed(&mut second).await;

    // the first session keeps its credits and keeps receiving
    assert_eq!(publisher.broker.registry().balance("U1").await, Some(5));
    publisher
        .notify(article("t", "b", "c", "2020-01-01T12:00:00Z"))
        .await;
    assert_eq!(next_json(&mut first).await["body"], "b");
}

#[tokio::test]
async fn test_missing_user_id_header() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.connect(None).await;

    assert_eq!(
        next_json(&mut client).await,
        json!({"error": "User id not found"})
    );
    expect_closed(&mut client).await;
    assert!(publisher.broker.registry().is_empty().await);
}

#[tokio::test]
async fn test_empty_user_id_header() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.connect(Some("")).await;

    assert_eq!(
        next_json(&mut client).await,
        json!({"error": "User id not found"})
    );
    expect_closed(&mut client).await;
}

#[tokio::test]
async fn test_fan_out_order_per_subscriber() {
    let publisher = TestPublisher::start(5).await;
    let mut u1 = publisher.subscribe("U1").await;
    let mut u2 = publisher.subscribe("U2").await;

    for title in ["A1", "A2", "A3"] {
        publisher
            .notify(article(title, "body", "news", "2020-01-01T12:00:00Z"))
            .await;
    }

    for client in [&mut u1, &mut u2] {
        let mut titles = Vec::new();
        for _ in 0..3 {
            let frame = next_json(client).await;
            assert_eq!(frame["body"], "body");
            titles.push(frame["title"].as_str().unwrap().to_string());
        }
        assert_eq!(titles, ["A1", "A2", "A3"]);
    }

    assert_eq!(publisher.broker.registry().balance("U1").await, Some(2));
    assert_eq!(publisher.broker.registry().balance("U2").await, Some(2));
}

#[tokio::test]
async fn test_disconnect_removes_session() {
    let publisher = TestPublisher::start(3).await;
    let mut client = publisher.subscribe("U1").await;

    client.send(Message::Close(None)).await.unwrap();
    drop(client);

    let registry = publisher.broker.registry().clone();
    wait_until(move || {
        let registry = registry.clone();
        async move { !registry.contains("U1").await }
    })
    .await;

    // articles after the disconnect go nowhere and break nothing
    publisher
        .notify(article("t", "b", "c", "2020-01-01T12:00:00Z"))
        .await;

    // the same user can come back with fresh credits
    let mut again = publisher.subscribe("U1").await;
    assert_eq!(publisher.broker.registry().balance("U1").await, Some(3));
    publisher
        .notify(article("back", "b", "c", "2020-01-01T12:00:00Z"))
        .await;
    assert_eq!(next_json(&mut again).await["title"], "back");
}

#[tokio::test]
async fn test_published_at_is_sent_in_utc() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.subscribe("U1").await;

    publisher
        .notify(article("t", "b", "c", "2020-01-01T13:00:00+01:00"))
        .await;
    assert_eq!(
        next_json(&mut client).await["published_at"],
        "2020-01-01T12:00:00Z"
    );
}

#[tokio::test]
async fn test_malformed_notification_does_not_break_stream() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.subscribe("U1").await;

    publisher.notify.send("not json".to_string()).await.unwrap();
    publisher
        .notify(article("ok", "b", "c", "2020-01-01T12:00:00Z"))
        .await;

    assert_eq!(next_json(&mut client).await["title"], "ok");
    assert_eq!(publisher.broker.metrics().snapshot().malformed_payloads, 1);
}

#[tokio::test]
async fn test_inbound_frames_are_ignored() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.subscribe("U1").await;

    client
        .send(Message::Text("hello".into()))
        .await
        .unwrap();
    publisher
        .notify(article("t", "b", "c", "2020-01-01T12:00:00Z"))
        .await;

    assert_eq!(next_json(&mut client).await["title"], "t");
    assert!(publisher.broker.registry().contains("U1").await);
}

#[tokio::test]
async fn test_non_ascii_user_id_is_accepted() {
    let publisher = TestPublisher::start(1).await;
    let mut client = publisher.subscribe("Zoë").await;

    publisher
        .notify(article("t", "b", "c", "2020-01-01T12:00:00Z"))
        .await;

    assert_eq!(next_json(&mut client).await["body"], "b");
    assert!(publisher.broker.registry().contains("Zoë").await);
}
