//! Admin endpoints: report updates, escalation views and channel
//! diagnostics.
//!
//! Per-channel delivery state is visible here only; submitters never see
//! channel configuration.

use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};

use haven_common::{AppError, AppResult};
use haven_core::{ChannelAttempt, ChannelsStatus, DispatchSummary, UpdateReportInput};
use haven_db::entities::{media_file, report};

use crate::{extractors::AdminAuth, middleware::AppState};

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/{id}", patch(update_report))
        .route("/reports/{id}/escalate", post(escalate_report))
        .route("/reports/escalations", get(list_escalations))
        .route("/media/orphans", get(list_orphans))
        .route("/media/{bucket}/{id}", delete(delete_media))
        .route("/channels", get(channels_status))
        .route("/channels/test", post(test_channels))
}

/// Admin-facing report view; message stays out of list responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminReportResponse {
    id: String,
    short_id: String,
    status: String,
    category: String,
    severity: String,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalated_at: Option<String>,
    has_media: bool,
}

impl From<report::Model> for AdminReportResponse {
    fn from(r: report::Model) -> Self {
        let has_media = r.has_media();
        Self {
            id: r.id,
            short_id: r.short_id,
            status: r.status.as_str().to_string(),
            category: r.category.as_str().to_string(),
            severity: r.severity.as_str().to_string(),
            created_at: r.created_at.to_rfc3339(),
            admin_notes: r.admin_notes,
            admin_response: r.admin_response,
            resolved_at: r.resolved_at.map(|t| t.to_rfc3339()),
            escalated_at: r.escalated_at.map(|t| t.to_rfc3339()),
            has_media,
        }
    }
}

/// Stored media object view for orphan listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaObjectResponse {
    id: String,
    bucket: String,
    filename: String,
    mime_type: String,
    size_bytes: i64,
    uploaded_at: String,
}

impl From<media_file::Model> for MediaObjectResponse {
    fn from(f: media_file::Model) -> Self {
        Self {
            id: f.id,
            bucket: f.bucket.as_str().to_string(),
            filename: f.filename,
            mime_type: f.mime_type,
            size_bytes: f.size_bytes,
            uploaded_at: f.uploaded_at.to_rfc3339(),
        }
    }
}

/// Response for a forced escalation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EscalateResponse {
    report: AdminReportResponse,
    dispatch: DispatchSummary,
}

/// Apply a status/notes/response update. Re-triggers a `report_updated`
/// dispatch.
async fn update_report(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateReportInput>,
) -> AppResult<Json<AdminReportResponse>> {
    let updated = state.report_service.update(&id, input).await?;
    Ok(Json(updated.into()))
}

/// Force-escalate a report and re-dispatch with the urgent channel set.
async fn escalate_report(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<EscalateResponse>> {
    let (report, dispatch) = state.report_service.escalate(&id).await?;
    Ok(Json(EscalateResponse {
        report: report.into(),
        dispatch,
    }))
}

/// Reports overdue for escalation, oldest first.
async fn list_escalations(
    _: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminReportResponse>>> {
    let hits = state.escalation_scanner.find_needing_escalation().await?;
    Ok(Json(hits.into_iter().map(Into::into).collect()))
}

/// Media objects not referenced by any report. Discovery only; nothing is
/// deleted here.
async fn list_orphans(
    _: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MediaObjectResponse>>> {
    let referenced: HashSet<String> = state
        .report_service
        .referenced_media_ids()
        .await?
        .into_iter()
        .collect();

    let orphans = state.media_service.find_orphans(&referenced).await?;
    Ok(Json(orphans.into_iter().map(Into::into).collect()))
}

/// Query parameters for media deletion.
#[derive(Debug, Default, Deserialize)]
struct DeleteMediaQuery {
    /// With `strict`, deleting a missing id fails instead of being a no-op.
    #[serde(default)]
    strict: bool,
}

/// Delete a stored media object, e.g. after an orphan sweep.
async fn delete_media(
    _: AdminAuth,
    State(state): State<AppState>,
    Path((bucket, id)): Path<(String, String)>,
    Query(query): Query<DeleteMediaQuery>,
) -> AppResult<impl axum::response::IntoResponse> {
    let bucket = match bucket.as_str() {
        "images" => media_file::MediaBucket::Images,
        "videos" => media_file::MediaBucket::Videos,
        _ => return Err(AppError::BadRequest(format!("Unknown bucket: {bucket}"))),
    };

    state.media_service.delete(bucket, &id, query.strict).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Per-channel configuration state.
async fn channels_status(
    _: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<Json<ChannelsStatus>> {
    Ok(Json(state.alert_dispatcher.channels_status()))
}

/// Attempt a test delivery on the urgent channels.
async fn test_channels(
    _: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ChannelAttempt>>> {
    Ok(Json(state.alert_dispatcher.send_test().await))
}
