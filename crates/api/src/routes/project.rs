//! Route definitions for the `/projects` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list (?page=&per_page=&q=)
/// POST   /                          -> create
/// GET    /new                       -> new_form
/// GET    /add_task                  -> add_task
/// GET    /{project}                 -> show
/// PUT    /{project}                 -> update
/// PATCH  /{project}                 -> update
/// DELETE /{project}                 -> delete
/// GET    /{project}/edit            -> edit_form
/// PATCH  /{project}/sort_tasks      -> sort_tasks
/// PATCH  /{project}/tasks/{id}/move -> move_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/new", get(project::new_form))
        .route("/add_task", get(project::add_task))
        .route(
            "/{project}",
            get(project::show)
                .put(project::update)
                .patch(project::update)
                .delete(project::delete),
        )
        .route("/{project}/edit", get(project::edit_form))
        .route("/{project}/sort_tasks", patch(project::sort_tasks))
        .route("/{project}/tasks/{id}/move", patch(project::move_task))
}
