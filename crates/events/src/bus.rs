//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ProjectEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use worklog_core::types::DbId;

/// Channel carrying changes to any project (the project list page).
pub const INDEX_CHANNEL: &str = "projects";

/// Channel carrying changes to a single project (its show page).
pub fn project_channel(project_id: DbId) -> String {
    format!("project:{project_id}")
}

// ---------------------------------------------------------------------------
// ProjectEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectEventKind {
    #[serde(rename = "project.created")]
    Created,
    #[serde(rename = "project.updated")]
    Updated,
    #[serde(rename = "project.deleted")]
    Deleted,
    #[serde(rename = "project.tasks_reordered")]
    TasksReordered,
}

impl ProjectEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectEventKind::Created => "project.created",
            ProjectEventKind::Updated => "project.updated",
            ProjectEventKind::Deleted => "project.deleted",
            ProjectEventKind::TasksReordered => "project.tasks_reordered",
        }
    }
}

/// A committed change to a project.
///
/// The payload is opaque to the bus; subscribers forward it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvent {
    pub event_type: ProjectEventKind,
    pub project_id: DbId,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ProjectEvent {
    /// Create an event with an empty object payload.
    pub fn new(event_type: ProjectEventKind, project_id: DbId) -> Self {
        Self {
            event_type,
            project_id,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Channels this event is delivered on.
    pub fn channels(&self) -> [String; 2] {
        [INDEX_CHANNEL.to_string(), project_channel(self.project_id)]
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use worklog_events::bus::{EventBus, ProjectEvent, ProjectEventKind};
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
///
/// bus.publish(ProjectEvent::new(ProjectEventKind::Created, 1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ProjectEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Never blocks.
    pub fn publish(&self, event: ProjectEvent) {
        tracing::debug!(
            event_type = event.event_type.as_str(),
            project_id = event.project_id,
            "Publishing project event"
        );
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }

    /// Number of receivers currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
