pub mod health;
pub mod project;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                  WebSocket live updates (?channels=)
///
/// /projects                            list, create
/// /projects/new                        blank form
/// /projects/add_task                   blank task row
/// /projects/{project}                  show, update, delete
/// /projects/{project}/edit             edit form
/// /projects/{project}/sort_tasks       reorder (PATCH)
/// /projects/{project}/tasks/{id}/move  drop one task on another (PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/projects", project::router())
}
