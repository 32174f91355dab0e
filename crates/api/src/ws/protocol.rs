//! JSON messages exchanged over the live-update socket.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use worklog_events::ProjectEvent;

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
}

/// Messages the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    Subscribed { channels: Vec<String> },
    Event {
        channels: [String; 2],
        #[serde(flatten)]
        event: &'a ProjectEvent,
    },
    Error { message: String },
}

impl ServerMessage<'_> {
    /// Encode as a text frame.
    pub fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Message::Text(text.into())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode WebSocket message");
                None
            }
        }
    }
}
