use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use bytes::Bytes;
use serde::Deserialize;

use kvstreamer_core::stream::Frame;

use super::{AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct FrameQuery {
    #[serde(default)]
    pub key_frame: bool,
}

/// Push one frame into the stream subscribed on `topic`
pub async fn ingest_frame(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(query): Query<FrameQuery>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let installer = state.controller.installer();

    // The wildcard capture drops the leading slash of rooted topic names
    let topic = if installer.is_subscribed(&topic) {
        topic
    } else {
        format!("/{topic}")
    };

    installer
        .dispatch(&topic, Frame::new(body, query.key_frame))
        .await?;
    Ok(StatusCode::ACCEPTED)
}
