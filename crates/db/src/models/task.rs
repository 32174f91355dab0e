//! Task entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use worklog_core::editor::ExistingTask;
use worklog_core::types::{DbId, Position, Timestamp};

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    /// Minutes.
    pub allotted_time: i32,
    pub position: Position,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn as_existing(&self) -> ExistingTask {
        ExistingTask {
            id: self.id,
            position: self.position,
        }
    }
}

/// DTO for inserting a task. `position` is always resolved before insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub title: String,
    pub allotted_time: i32,
    pub position: Position,
}

/// DTO for updating a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub allotted_time: Option<i32>,
    pub position: Option<Position>,
}
