//! Polling fallback endpoints.
//!
//! For admin clients without a live push connection. `poll` drains the
//! fallback buffer with at-most-once delivery per poll; push and poll are
//! independent at-least-once channels with no dedup between them.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use haven_common::AppResult;
use haven_core::{BufferStatus, NotificationEvent};

use crate::{extractors::AdminAuth, middleware::AppState};

/// Create the polling router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(poll))
        .route("/status", get(status))
        .route("/cleanup", post(cleanup))
}

/// Response for a poll call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollResponse {
    events: Vec<NotificationEvent>,
    count: usize,
}

/// Response for a cleanup call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    removed: usize,
}

/// Drain undelivered events, marking them delivered.
async fn poll(_: AdminAuth, State(state): State<AppState>) -> AppResult<Json<PollResponse>> {
    let events = state.notification_buffer.drain().await;
    let count = events.len();
    Ok(Json(PollResponse { events, count }))
}

/// Buffer health.
async fn status(_: AdminAuth, State(state): State<AppState>) -> AppResult<Json<BufferStatus>> {
    Ok(Json(state.notification_buffer.status().await))
}

/// Purge delivered events.
async fn cleanup(_: AdminAuth, State(state): State<AppState>) -> AppResult<Json<CleanupResponse>> {
    let removed = state.notification_buffer.cleanup().await;
    Ok(Json(CleanupResponse { removed }))
}
