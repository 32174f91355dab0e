//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Page-based pagination with an optional name filter
/// (`?page=&per_page=&q=`).
///
/// Values are clamped in the handler via `clamp_page` / `clamp_limit`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
}

/// Channels requested on the WebSocket upgrade (`?channels=a,b`).
#[derive(Debug, Default, Deserialize)]
pub struct ChannelParams {
    pub channels: Option<String>,
}

impl ChannelParams {
    pub fn list(&self) -> Vec<String> {
        self.channels
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}
