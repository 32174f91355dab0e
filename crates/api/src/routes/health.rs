//! Health check, mounted at the server root rather than under `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Open live-update sockets.
    pub ws_connections: usize,
    /// Receivers attached to the project event bus. Zero means committed
    /// changes are not being forwarded to any socket.
    pub event_subscribers: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = worklog_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        ws_connections: state.ws_manager.connection_count().await,
        event_subscribers: state.event_bus.subscriber_count(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
