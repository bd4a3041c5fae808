use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    /// Only forward events about this market.
    pub market_id: Option<Uuid>,
}

/// GET /ws: stream ledger events as JSON text frames.
pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_events(socket, state, query.market_id))
}

async fn stream_events(socket: WebSocket, state: AppState, market_id: Option<Uuid>) {
    tracing::info!(market_id = ?market_id, "Market event subscriber connected");

    let (mut sink, mut incoming) = socket.split();
    let mut events = state.engine.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(msg) => {
                    if market_id.is_some_and(|id| msg.market_id() != id) {
                        continue;
                    }
                    let text = match serde_json::to_string(&msg) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize market event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Market event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            frame = incoming.next() => match frame {
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(market_id = ?market_id, "Market event subscriber disconnected");
}
