//! `/subscribe`: streams articles to one websocket per user.

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dto::{ALREADY_SUBSCRIBED, ErrorFrame, USER_ID_NOT_FOUND};
use crate::state::PublisherState;

/// Header carrying the subscriber's user id.
pub const USER_ID_HEADER: &str = "Y-User-ID";

/// GET /subscribe: websocket upgrade
pub async fn subscribe(
    State(state): State<PublisherState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(error = %rejection, "Subscribe upgrade failed");
            return rejection.into_response();
        }
    };

    // Header values may carry non-ASCII bytes; keep them rather than
    // treating the header as missing.
    let user_id = headers
        .get(USER_ID_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();

    ws.on_upgrade(move |socket| handle_subscriber(state, user_id, socket))
}

/// Runs one subscriber connection until either side goes away.
async fn handle_subscriber(state: PublisherState, user_id: String, mut socket: WebSocket) {
    if user_id.is_empty() {
        warn!("Subscriber connected without a user id");
        reject(&mut socket, USER_ID_NOT_FOUND).await;
        return;
    }

    let Some(mut subscription) = state.broker.add_subscriber(&user_id).await else {
        warn!(user_id = %user_id, "Subscriber already connected");
        reject(&mut socket, ALREADY_SUBSCRIBED).await;
        return;
    };

    info!(user_id = %user_id, "Subscriber connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Inbound frames carry nothing; reading only detects the peer leaving.
    let peer_gone = CancellationToken::new();
    let detector = tokio::spawn({
        let peer_gone = peer_gone.clone();
        let user_id = user_id.clone();
        async move {
            while let Some(frame) = ws_rx.next().await {
                match frame {
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(user_id = %user_id, error = %e, "Subscriber connection interrupted");
                        break;
                    }
                }
            }
            peer_gone.cancel();
        }
    });

    loop {
        let article = tokio::select! {
            _ = peer_gone.cancelled() => {
                info!(user_id = %user_id, "Subscriber disconnected");
                break;
            }
            article = subscription.recv() => article,
        };

        let Some(article) = article else {
            debug!(user_id = %user_id, "Subscriber session closed by broker");
            break;
        };

        let frame = match article.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to encode article");
                continue;
            }
        };

        if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
            warn!(user_id = %user_id, error = %e, "Subscriber write failed");
            break;
        }
    }

    // Cleanup
    subscription.depart();
    state.broker.remove_subscriber(&user_id).await;
    detector.abort();
    drop(subscription);
    let _ = ws_tx.close().await;
}

/// Sends a single error frame followed by a close frame.
async fn reject(socket: &mut WebSocket, reason: &str) {
    match serde_json::to_string(&ErrorFrame::new(reason)) {
        Ok(frame) => {
            if let Err(e) = socket.send(Message::Text(frame.into())).await {
                debug!(error = %e, "Failed to send error frame");
                return;
            }
        }
        Err(e) => error!(error = %e, "Failed to encode error frame"),
    }

    let close = CloseFrame {
        code: close_code::NORMAL,
        reason: "".into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(close))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}
