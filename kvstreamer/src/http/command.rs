use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommandRequest {
    pub enable: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
}

/// Enable or disable the stream group
///
/// A rejected command still answers the caller, then asks the process to
/// shut down.
pub async fn handle_command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    info!(enable = req.enable, "Received stream group command");

    match state.controller.command(req.enable).await {
        Ok(()) => (StatusCode::OK, Json(CommandResponse { success: true })),
        Err(e) => {
            error!(enable = req.enable, error = %e, "Stream group command failed, requesting shutdown");
            state.shutdown.cancel();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CommandResponse { success: false }),
            )
        }
    }
}
