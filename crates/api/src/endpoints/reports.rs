//! Report endpoints: intake, status lookup and media retrieval.

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Serialize;

use haven_common::{AppError, AppResult};
use haven_core::{StatusView, SubmitReportInput, UploadMediaInput};
use haven_db::entities::media_file::MediaBucket;
use haven_db::entities::report::{ReportCategory, ReportSeverity};

use crate::{extractors::is_admin, middleware::AppState};

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_report))
        .route("/{id}", get(get_report))
        .route("/short/{short_id}", get(get_report_by_short_id))
        .route("/{id}/media/{kind}", get(get_report_media))
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReportResponse {
    id: String,
    short_id: String,
    status: String,
    created_at: String,
}

/// One uploaded file collected from the multipart form.
struct FilePart {
    field: String,
    filename: String,
    mime_type: String,
    data: Bytes,
}

/// Submit a new report via multipart form.
///
/// Media parts are persisted before the report record is created, so the
/// record never references an id that does not durably exist. An
/// unsupported MIME type rejects the whole submission before any bytes are
/// written.
async fn submit_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut message: Option<String> = None;
    let mut category: Option<String> = None;
    let mut severity: Option<String> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;
    let mut accuracy: Option<f64> = None;
    let mut address: Option<String> = None;
    let mut files: Vec<FilePart> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "photo" | "video" | "media" => {
                let filename = field
                    .file_name()
                    .map_or_else(|| "unnamed".to_string(), ToString::to_string);
                let mime_type = field
                    .content_type()
                    .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                files.push(FilePart {
                    field: name,
                    filename,
                    mime_type,
                    data,
                });
            }
            "message" => message = Some(read_text(field).await?),
            "category" => category = Some(read_text(field).await?),
            "severity" => severity = Some(read_text(field).await?),
            "latitude" => latitude = parse_float("latitude", &read_text(field).await?)?,
            "longitude" => longitude = parse_float("longitude", &read_text(field).await?)?,
            "accuracy" => accuracy = parse_float("accuracy", &read_text(field).await?)?,
            "address" => address = Some(read_text(field).await?),
            _ => {}
        }
    }

    let message =
        message.ok_or_else(|| AppError::Validation("message is required".to_string()))?;
    let category: ReportCategory = parse_enum(
        "category",
        &category.ok_or_else(|| AppError::Validation("category is required".to_string()))?,
    )?;
    let severity: ReportSeverity = parse_enum(
        "severity",
        &severity.ok_or_else(|| AppError::Validation("severity is required".to_string()))?,
    )?;

    // Reject unsupported MIME types before any bytes reach the store
    for file in &files {
        check_file_bucket(file)?;
    }

    // Media first: the record must never reference an id that is not
    // durably stored yet.
    let mut photo_file_id: Option<String> = None;
    let mut video_file_id: Option<String> = None;
    let mut additional_media_ids: Vec<String> = Vec::new();

    for file in files {
        let field = file.field.clone();
        let stored = state
            .media_service
            .upload_bytes(
                UploadMediaInput {
                    filename: file.filename,
                    mime_type: file.mime_type,
                    metadata: Some(serde_json::json!({ "source": "report_submission" })),
                },
                file.data,
            )
            .await?;

        match field.as_str() {
            "photo" => photo_file_id = Some(stored.id),
            "video" => video_file_id = Some(stored.id),
            _ => additional_media_ids.push(stored.id),
        }
    }

    let report = state
        .report_service
        .submit(SubmitReportInput {
            message,
            category,
            severity,
            latitude,
            longitude,
            accuracy,
            address,
            photo_file_id,
            video_file_id,
            additional_media_ids,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitReportResponse {
            id: report.id,
            short_id: report.short_id,
            status: report.status.as_str().to_string(),
            created_at: report.created_at.to_rfc3339(),
        }),
    ))
}

/// Look up a report by primary ID.
async fn get_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<StatusView>> {
    let report = state.report_service.get_by_id(&id).await?;
    let authorized = is_admin(&headers, &state);
    Ok(Json(state.report_service.status_view(&report, authorized)?))
}

/// Look up a report by its short share code.
async fn get_report_by_short_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(short_id): Path<String>,
) -> AppResult<Json<StatusView>> {
    let report = state.report_service.get_by_short_id(&short_id).await?;
    let authorized = is_admin(&headers, &state);
    Ok(Json(state.report_service.status_view(&report, authorized)?))
}

/// Stream a report's photo or video with the stored MIME type.
async fn get_report_media(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> AppResult<Response> {
    let report = state.report_service.get_by_id(&id).await?;

    let (bucket, file_id) = match kind.as_str() {
        "photo" => (MediaBucket::Images, report.photo_file_id),
        "video" => (MediaBucket::Videos, report.video_file_id),
        _ => {
            return Err(AppError::BadRequest(format!(
                "Unknown media kind: {kind}"
            )));
        }
    };

    let file_id =
        file_id.ok_or_else(|| AppError::NotFound(format!("report {id} has no {kind}")))?;

    let (file, content) = state
        .media_service
        .open_read_stream(bucket, &file_id)
        .await?;

    Response::builder()
        .header(header::CONTENT_TYPE, file.mime_type)
        .header(header::CONTENT_LENGTH, file.size_bytes)
        .body(Body::from_stream(content))
        .map_err(|e| AppError::Internal(format!("Failed to build media response: {e}")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_float(name: &str, value: &str) -> AppResult<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Invalid {name}: {value}")))
}

fn parse_enum<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> AppResult<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| AppError::Validation(format!("Invalid {name}: {value}")))
}

/// Enforce that each part's MIME type routes to a bucket matching its role.
fn check_file_bucket(file: &FilePart) -> AppResult<()> {
    let bucket = MediaBucket::for_mime(&file.mime_type)
        .ok_or_else(|| AppError::UnsupportedMedia(file.mime_type.clone()))?;

    let expected = match file.field.as_str() {
        "photo" => Some(MediaBucket::Images),
        "video" => Some(MediaBucket::Videos),
        _ => None,
    };

    if let Some(expected) = expected
        && bucket != expected
    {
        return Err(AppError::UnsupportedMedia(format!(
            "{} part cannot be {}",
            file.field, file.mime_type
        )));
    }

    Ok(())
}
