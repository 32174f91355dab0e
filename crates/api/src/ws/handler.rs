use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::query::ChannelParams;
use crate::state::AppState;
use crate::ws::manager::WsManager;
use crate::ws::protocol::{ClientMessage, ServerMessage};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Channels listed in `?channels=` are subscribed before the first event
/// can arrive; more can be added later with `subscribe` messages.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ChannelParams>,
) -> impl IntoResponse {
    let channels = params.list();
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, channels))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound subscribe/unsubscribe messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, channels: Vec<String>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, ?channels, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), channels).await;
    acknowledge(&ws_manager, &conn_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => handle_text(&ws_manager, &conn_id, text.as_str()).await,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn handle_text(ws_manager: &WsManager, conn_id: &str, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Subscribe { channel }) => {
            ws_manager.subscribe(conn_id, &channel).await;
            acknowledge(ws_manager, conn_id).await;
        }
        Ok(ClientMessage::Unsubscribe { channel }) => {
            ws_manager.unsubscribe(conn_id, &channel).await;
            acknowledge(ws_manager, conn_id).await;
        }
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Unrecognised WebSocket message");
            let reply = ServerMessage::Error {
                message: format!("Unrecognised message: {e}"),
            };
            if let Some(msg) = reply.to_message() {
                ws_manager.send_to(conn_id, msg).await;
            }
        }
    }
}

/// Tell the client which channels it now listens on.
async fn acknowledge(ws_manager: &WsManager, conn_id: &str) {
    let reply = ServerMessage::Subscribed {
        channels: ws_manager.channels_of(conn_id).await,
    };
    if let Some(msg) = reply.to_message() {
        ws_manager.send_to(conn_id, msg).await;
    }
}
