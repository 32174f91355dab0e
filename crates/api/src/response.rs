//! Shared response envelope types for API handlers.
//!
//! Reads use a `{ "data": ... }` envelope. Successful writes add the notice
//! and the path the client should navigate to next.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "notice": ..., "redirect": ..., "data": T }` returned after a saved form.
#[derive(Debug, Serialize)]
pub struct SavedResponse<T: Serialize> {
    pub notice: &'static str,
    pub redirect: String,
    pub data: T,
}

/// `{ "status": "success", "message": ... }` for writes with no useful body.
#[derive(Debug, Serialize)]
pub struct StatusResponse<T: Serialize = ()> {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl StatusResponse {
    pub fn success(message: &'static str) -> Self {
        Self {
            status: "success",
            message,
            data: None,
        }
    }
}

impl<T: Serialize> StatusResponse<T> {
    pub fn success_with(message: &'static str, data: T) -> Self {
        Self {
            status: "success",
            message,
            data: Some(data),
        }
    }
}
