// HTTP control surface
//
// Stands in for the host messaging framework: the enable/disable command
// service, the latched status and frame ingress for subscribed topics.

pub mod command;
pub mod error;
pub mod frames;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use kvstreamer_core::StreamGroupController;

pub use error::{AppError, AppResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<StreamGroupController>,
    /// Cancelled to request an orderly process shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(controller: Arc<StreamGroupController>, shutdown: CancellationToken) -> Self {
        Self {
            controller,
            shutdown,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(status::health_check))
        .route("/command", post(command::handle_command))
        .route("/enabled", get(status::get_enabled))
        .route("/streams", get(status::list_streams))
        .route("/frames/{*topic}", post(frames::ingest_frame))
        .with_state(state)
}
