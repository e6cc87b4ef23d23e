use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use kvstreamer_core::stream::StreamEntry;

use super::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnabledResponse {
    pub enabled: bool,
    pub publish_count: u64,
}

/// Basic health check (always returns OK if server is running)
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Last published value of the enabled flag
pub async fn get_enabled(State(state): State<AppState>) -> Json<EnabledResponse> {
    let status = state.controller.status();
    Json(EnabledResponse {
        enabled: status.current(),
        publish_count: status.publish_count(),
    })
}

pub async fn list_streams(State(state): State<AppState>) -> Json<Vec<StreamEntry>> {
    Json(state.controller.streams().await)
}
