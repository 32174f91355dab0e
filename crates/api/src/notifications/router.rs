//! Event-to-socket routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and forwards each
//! [`ProjectEvent`] to the WebSocket connections listening on one of the
//! event's channels.

use std::sync::Arc;

use tokio::sync::broadcast;
use worklog_events::ProjectEvent;

use crate::ws::protocol::ServerMessage;
use crate::ws::WsManager;

/// Routes project events to subscribed WebSocket connections.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](worklog_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<ProjectEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.route_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns the number of connections reached.
    pub async fn route_event(&self, event: &ProjectEvent) -> usize {
        let channels = event.channels();
        let message = ServerMessage::Event {
            channels: channels.clone(),
            event,
        };
        let Some(frame) = message.to_message() else {
            return 0;
        };
        let delivered = self.ws_manager.send_to_channels(&channels, frame).await;
        tracing::debug!(
            event_type = event.event_type.as_str(),
            project_id = event.project_id,
            delivered,
            "Routed project event"
        );
        delivered
    }
}
