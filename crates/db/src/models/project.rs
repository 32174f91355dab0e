//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use worklog_core::time::{format_minutes, total_minutes};
use worklog_core::types::{DbId, Timestamp};

use crate::models::task::Task;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a project. The slug is derived by the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

/// A project together with its tasks in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
    /// Sum of the tasks' allotted minutes.
    pub total_allotted_time: i64,
    /// `total_allotted_time` rendered as `"1h 30m"`.
    pub total_allotted_time_label: String,
}

impl ProjectWithTasks {
    pub fn new(project: Project, tasks: Vec<Task>) -> Self {
        let total = total_minutes(tasks.iter().map(|t| t.allotted_time));
        Self {
            project,
            tasks,
            total_allotted_time: total,
            total_allotted_time_label: format_minutes(total),
        }
    }

    /// Task ids in display order.
    pub fn task_ids(&self) -> Vec<DbId> {
        self.tasks.iter().map(|t| t.id).collect()
    }
}

/// One page of the project list.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<Project>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub per_page: i64,
}
