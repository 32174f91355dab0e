//! Transactional application of nested project + tasks submissions.
//!
//! The submission is validated and planned by
//! [`worklog_core::editor::plan_edit`]; [`ProjectEditor`] wraps planning and
//! the resulting writes in one transaction so a submission is saved entirely
//! or not at all.

use sqlx::{PgPool, Postgres, Transaction};
use worklog_core::editor::{plan_edit, EditPlan, ExistingTask, PlanError};
use worklog_core::form::ProjectForm;
use worklog_core::types::DbId;

use crate::models::project::{CreateProject, ProjectWithTasks};
use crate::models::task::{CreateTask, UpdateTask};
use crate::repositories::{ProjectRepo, TaskRepo};

/// Result of a submission that reached the database layer.
#[derive(Debug)]
pub enum EditOutcome {
    /// Everything was written and committed.
    Saved(ProjectWithTasks),
    /// The plan was refused; nothing was written.
    Rejected(PlanError),
}

/// Applies nested project forms.
pub struct ProjectEditor;

impl ProjectEditor {
    /// Create a project together with the tasks in `form`.
    pub async fn create(pool: &PgPool, form: &ProjectForm) -> Result<EditOutcome, sqlx::Error> {
        // A new project has no persisted siblings: the batch is the sibling set.
        let plan = match plan_edit(form, &[]) {
            Ok(plan) => plan,
            Err(rejection) => return Ok(EditOutcome::Rejected(rejection)),
        };

        let mut tx = pool.begin().await?;
        let project = ProjectRepo::create_in(
            &mut tx,
            &CreateProject {
                name: plan.project.name.clone(),
                description: plan.project.description.clone(),
            },
        )
        .await?;
        Self::apply_tasks(&mut tx, project.id, &plan).await?;
        let tasks = TaskRepo::list_by_project_in(&mut tx, project.id).await?;
        tx.commit().await?;

        tracing::info!(
            project_id = project.id,
            created = plan.creates.len(),
            "Project created"
        );
        Ok(EditOutcome::Saved(ProjectWithTasks::new(project, tasks)))
    }

    /// Update a project and its tasks from `form`.
    ///
    /// Returns `None` if the project does not exist.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        form: &ProjectForm,
    ) -> Result<Option<EditOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = ProjectRepo::lock_in(&mut tx, project_id).await? else {
            return Ok(None);
        };
        let existing: Vec<ExistingTask> = TaskRepo::list_by_project_in(&mut tx, project_id)
            .await?
            .iter()
            .map(|t| t.as_existing())
            .collect();

        let plan = match plan_edit(form, &existing) {
            Ok(plan) => plan,
            Err(rejection) => {
                tx.rollback().await?;
                tracing::debug!(project_id, error = %rejection, "Project update rejected");
                return Ok(Some(EditOutcome::Rejected(rejection)));
            }
        };

        let project = ProjectRepo::replace_fields_in(&mut tx, &current, &plan.project).await?;
        Self::apply_tasks(&mut tx, project_id, &plan).await?;
        let tasks = TaskRepo::list_by_project_in(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(
            project_id,
            created = plan.creates.len(),
            updated = plan.updates.len(),
            deleted = plan.deletes.len(),
            "Project updated"
        );
        Ok(Some(EditOutcome::Saved(ProjectWithTasks::new(
            project, tasks,
        ))))
    }

    /// Deletes first, then updates, then inserts.
    async fn apply_tasks(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        plan: &EditPlan,
    ) -> Result<(), sqlx::Error> {
        TaskRepo::delete_in(tx, project_id, &plan.deletes).await?;

        for update in &plan.updates {
            let input = UpdateTask {
                title: Some(update.title.clone()),
                allotted_time: Some(update.allotted_time),
                position: update.position,
            };
            // The planner only accepts ids of this project and the project row
            // is locked, so the task is still there.
            TaskRepo::update_in(tx, project_id, update.id, &input)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
        }

        for create in &plan.creates {
            let input = CreateTask {
                project_id,
                title: create.title.clone(),
                allotted_time: create.allotted_time,
                position: create.position,
            };
            TaskRepo::create_in(tx, &input).await?;
        }

        Ok(())
    }
}
