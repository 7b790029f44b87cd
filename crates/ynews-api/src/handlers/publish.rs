//! `/publish`: journalist ingestion sink.

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use ynews_core::types::article::ArticleDraft;

use crate::state::AggregatorState;

/// GET /publish: websocket upgrade
pub async fn publish(
    State(state): State<AggregatorState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_journalist(state, socket)),
        Err(rejection) => {
            warn!(error = %rejection, "Publish upgrade failed");
            rejection.into_response()
        }
    }
}

/// Stores every article frame until the journalist leaves or sends
/// something unusable. Nothing is ever written back.
async fn handle_journalist(state: AggregatorState, mut socket: WebSocket) {
    info!("Journalist connected");

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                warn!("Closing connection: binary frames are not accepted");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Closing connection: read error");
                break;
            }
        };

        let draft: ArticleDraft = match serde_json::from_str(text.as_str()) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Closing connection: malformed article");
                break;
            }
        };

        match state.store.store(draft).await {
            Ok(article) => debug!(title = %article.title, "Article accepted"),
            Err(e) => {
                warn!(error = %e, "Closing connection: failed to store article");
                break;
            }
        }
    }

    info!("Journalist disconnected");
}
