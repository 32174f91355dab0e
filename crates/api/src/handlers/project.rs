//! Handlers for the `/projects` resource.
//!
//! `{project}` path segments accept either the numeric id or the slug.
//! Every committed write publishes a [`ProjectEvent`] after the transaction
//! has been committed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use worklog_core::drag::move_item;
use worklog_core::editor::PlanError;
use worklog_core::error::CoreError;
use worklog_core::form::{
    FormInputs, FormPayload, MoveTaskForm, ProjectForm, ProjectSubmission, SortTasksForm,
    TaskRowInputs,
};
use worklog_core::position::validate_reorder;
use worklog_core::search::{clamp_limit, clamp_page, normalize_search, MAX_PER_PAGE};
use worklog_core::types::DbId;
use worklog_db::editor::{EditOutcome, ProjectEditor};
use worklog_db::models::project::{Project, ProjectPage, ProjectWithTasks};
use worklog_db::models::task::Task;
use worklog_db::repositories::{ProjectRepo, ReorderOutcome, TaskRepo};
use worklog_events::{project_channel, ProjectEvent, ProjectEventKind};

use crate::error::{AppError, AppResult};
use crate::query::ProjectListParams;
use crate::response::{DataResponse, SavedResponse, StatusResponse};
use crate::state::AppState;

const PROJECTS_PATH: &str = "/projects";

/// Project detail plus the live-update channel the client should join.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectWithTasks,
    pub channel: String,
}

/// Template for one freshly added task row.
#[derive(Debug, Serialize)]
pub struct TaskTemplate {
    pub task: TaskRowInputs,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<DataResponse<ProjectPage>>> {
    let per_page = clamp_limit(params.per_page, state.config.projects_per_page, MAX_PER_PAGE);
    let page = clamp_page(params.page);
    let search = normalize_search(params.q.as_deref());

    let projects = ProjectRepo::list_page(&state.pool, page, per_page, search.as_deref()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/new
pub async fn new_form() -> Json<DataResponse<FormPayload>> {
    Json(DataResponse {
        data: FormPayload::new_project(PROJECTS_PATH),
    })
}

/// GET /api/v1/projects/add_task
pub async fn add_task() -> Json<TaskTemplate> {
    Json(TaskTemplate {
        task: TaskRowInputs::blank(),
    })
}

/// GET /api/v1/projects/{project}
pub async fn show(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = find_project(&state, &key).await?;
    let tasks = TaskRepo::list_by_project(&state.pool, project.id).await?;
    let channel = project_channel(project.id);
    Ok(Json(DataResponse {
        data: ProjectDetail {
            project: ProjectWithTasks::new(project, tasks),
            channel,
        },
    }))
}

/// GET /api/v1/projects/{project}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<FormPayload>>> {
    let project = find_project(&state, &key).await?;
    let tasks = TaskRepo::list_by_project(&state.pool, project.id).await?;

    let mut inputs = FormInputs::new(&project.name, project.description.as_deref());
    inputs.tasks_attributes = tasks
        .iter()
        .map(|t| TaskRowInputs::persisted(t.id, &t.title, t.allotted_time))
        .collect();

    Ok(Json(DataResponse {
        data: FormPayload::edit_project(project_path(&project), inputs),
    }))
}

// ---------------------------------------------------------------------------
// Nested writes
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(submission): Json<ProjectSubmission>,
) -> AppResult<(StatusCode, Json<SavedResponse<ProjectWithTasks>>)> {
    let form = submission.project;
    match ProjectEditor::create(&state.pool, &form).await? {
        EditOutcome::Saved(project) => {
            publish(&state, ProjectEventKind::Created, &project);
            Ok((
                StatusCode::CREATED,
                Json(SavedResponse {
                    notice: "Project created successfully",
                    redirect: PROJECTS_PATH.to_string(),
                    data: project,
                }),
            ))
        }
        EditOutcome::Rejected(rejection) => Err(rejected_form(
            rejection,
            "There was an error creating your project",
            PROJECTS_PATH.to_string(),
            "post",
            &form,
        )),
    }
}

/// PUT|PATCH /api/v1/projects/{project}
pub async fn update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(submission): Json<ProjectSubmission>,
) -> AppResult<Json<SavedResponse<ProjectWithTasks>>> {
    let current = find_project(&state, &key).await?;
    let form = submission.project;

    let outcome = ProjectEditor::update(&state.pool, current.id, &form)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: current.id,
        }))?;

    match outcome {
        EditOutcome::Saved(project) => {
            publish(&state, ProjectEventKind::Updated, &project);
            Ok(Json(SavedResponse {
                notice: "Project updated successfully",
                redirect: project_path(&project.project),
                data: project,
            }))
        }
        EditOutcome::Rejected(rejection) => Err(rejected_form(
            rejection,
            "There was an error updating your project",
            project_path(&current),
            "patch",
            &form,
        )),
    }
}

/// DELETE /api/v1/projects/{project}
pub async fn delete(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    let project = find_project(&state, &key).await?;
    if !ProjectRepo::delete(&state.pool, project.id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project.id,
        }));
    }

    state.event_bus.publish(
        ProjectEvent::new(ProjectEventKind::Deleted, project.id)
            .with_payload(json!({ "slug": project.slug, "name": project.name })),
    );
    Ok(Json(StatusResponse::success("Project deleted successfully")))
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// PATCH /api/v1/projects/{project}/sort_tasks
pub async fn sort_tasks(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SortTasksForm>,
) -> AppResult<Json<StatusResponse<Vec<Task>>>> {
    validate_reorder(&body.task_ids)?;
    let project = find_project(&state, &key).await?;

    let tasks = apply_order(&state, project.id, &body.task_ids).await?;
    Ok(Json(StatusResponse::success_with("Tasks reordered", tasks)))
}

/// PATCH /api/v1/projects/{project}/tasks/{id}/move
///
/// Moves one task above or below another and persists the resulting order
/// of the whole list. Dropping a task on itself, or where it already is,
/// writes nothing.
pub async fn move_task(
    State(state): State<AppState>,
    Path((key, task_id)): Path<(String, DbId)>,
    Json(body): Json<MoveTaskForm>,
) -> AppResult<Json<StatusResponse<Vec<Task>>>> {
    let project = find_project(&state, &key).await?;
    let tasks = TaskRepo::list_by_project(&state.pool, project.id).await?;
    let order: Vec<DbId> = tasks.iter().map(|t| t.id).collect();

    for id in [task_id, body.target_id] {
        if !order.contains(&id) {
            return Err(AppError::Core(CoreError::NotFound { entity: "Task", id }));
        }
    }

    let Some(new_order) = move_item(&order, &task_id, &body.target_id, body.placement) else {
        return Ok(Json(StatusResponse::success_with("Task order unchanged", tasks)));
    };

    let tasks = apply_order(&state, project.id, &new_order).await?;
    Ok(Json(StatusResponse::success_with("Task moved", tasks)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_project(state: &AppState, key: &str) -> AppResult<Project> {
    ProjectRepo::find_by_key(&state.pool, key)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByKey {
                entity: "Project",
                key: key.to_string(),
            })
        })
}

/// Persist `task_ids` as the project's order and announce it.
async fn apply_order(state: &AppState, project_id: DbId, task_ids: &[DbId]) -> AppResult<Vec<Task>> {
    let tasks = match TaskRepo::reorder(&state.pool, project_id, task_ids).await? {
        ReorderOutcome::Reordered(tasks) => tasks,
        ReorderOutcome::ProjectNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            }))
        }
        ReorderOutcome::ForeignTasks => {
            return Err(AppError::Core(CoreError::Validation(
                "Task IDs must all belong to this project".to_string(),
            )))
        }
    };

    state.event_bus.publish(
        ProjectEvent::new(ProjectEventKind::TasksReordered, project_id)
            .with_payload(json!({ "task_ids": task_ids })),
    );
    Ok(tasks)
}

fn project_path(project: &Project) -> String {
    format!("{PROJECTS_PATH}/{}", project.slug)
}

fn publish(state: &AppState, kind: ProjectEventKind, project: &ProjectWithTasks) {
    state.event_bus.publish(
        ProjectEvent::new(kind, project.project.id).with_payload(json!({
            "slug": project.project.slug,
            "name": project.project.name,
            "task_ids": project.task_ids(),
            "total_allotted_time": project.total_allotted_time,
        })),
    );
}

fn rejected_form(
    rejection: PlanError,
    message: &str,
    action: String,
    method: &'static str,
    form: &ProjectForm,
) -> AppError {
    match rejection {
        PlanError::Invalid(errors) => AppError::InvalidForm {
            message: message.to_string(),
            form: Box::new(FormPayload::rejected(action, method, form, errors)),
        },
        PlanError::UnknownTask(id) => AppError::Core(CoreError::NotFound { entity: "Task", id }),
    }
}
