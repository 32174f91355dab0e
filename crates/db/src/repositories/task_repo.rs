//! Repository for the `tasks` table.
//!
//! Tasks are always listed in display order: `position`, then `created_at`.

use sqlx::{PgPool, Postgres, Transaction};
use worklog_core::position::reorder_assignments;
use worklog_core::types::{DbId, Position};

use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::repositories::ProjectRepo;

/// Result of [`TaskRepo::reorder`].
#[derive(Debug)]
pub enum ReorderOutcome {
    /// Positions were written; the project's tasks in their new order.
    Reordered(Vec<Task>),
    /// The project does not exist (or was deleted meanwhile).
    ProjectNotFound,
    /// At least one id is not a task of the project. Nothing was written.
    ForeignTasks,
}

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, title, allotted_time, position, created_at, updated_at";

/// Display order shared by every listing query.
const ORDER: &str = "ORDER BY position, created_at, id";

/// Provides CRUD and ordering operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task with an already resolved position.
    pub(crate) async fn create_in(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, title, allotted_time, position) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(input.allotted_time)
            .bind(input.position)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a project's tasks in display order.
    pub async fn list_by_project(pool: &PgPool, project_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE project_id = $1 {ORDER}");
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub(crate) async fn list_by_project_in(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE project_id = $1 {ORDER}");
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// Update a task of `project_id`. Only non-`None` fields are applied.
    ///
    /// Returns `None` if the task does not exist in that project.
    pub(crate) async fn update_in(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET \
                title = COALESCE($3, title), \
                allotted_time = COALESCE($4, allotted_time), \
                position = COALESCE($5, position) \
             WHERE id = $1 AND project_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(project_id)
            .bind(&input.title)
            .bind(input.allotted_time)
            .bind(input.position)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Delete the listed tasks of `project_id`. Returns the number removed.
    pub(crate) async fn delete_in(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1 AND id = ANY($2)")
            .bind(project_id)
            .bind(ids)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Rewrite positions so that `task_ids[i]` gets position `i`.
    ///
    /// Only positions are written; titles and times are not revalidated.
    /// Tasks missing from the list keep their position. Nothing is written
    /// unless the project exists and every id is one of its tasks.
    pub async fn reorder(
        pool: &PgPool,
        project_id: DbId,
        task_ids: &[DbId],
    ) -> Result<ReorderOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if ProjectRepo::lock_in(&mut tx, project_id).await?.is_none() {
            return Ok(ReorderOutcome::ProjectNotFound);
        }

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND id = ANY($2)")
                .bind(project_id)
                .bind(task_ids)
                .fetch_one(&mut *tx)
                .await?;
        if owned != task_ids.len() as i64 {
            tracing::debug!(
                project_id,
                requested = task_ids.len(),
                owned,
                "Reorder names tasks outside the project"
            );
            return Ok(ReorderOutcome::ForeignTasks);
        }

        let (ids, positions): (Vec<DbId>, Vec<Position>) =
            reorder_assignments(task_ids).into_iter().unzip();

        // Rows already at their target position are left alone, which keeps a
        // repeated reorder a true no-op.
        let result = sqlx::query(
            "UPDATE tasks SET position = o.position \
             FROM UNNEST($2::bigint[], $3::int[]) AS o(id, position) \
             WHERE tasks.id = o.id AND tasks.project_id = $1 \
               AND tasks.position <> o.position",
        )
        .bind(project_id)
        .bind(&ids)
        .bind(&positions)
        .execute(&mut *tx)
        .await?;

        let tasks = Self::list_by_project_in(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(
            project_id,
            count = task_ids.len(),
            changed = result.rows_affected(),
            "Tasks reordered"
        );
        Ok(ReorderOutcome::Reordered(tasks))
    }
}
