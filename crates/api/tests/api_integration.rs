//! API integration tests.
//!
//! These tests verify the API endpoints work correctly together.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use haven_api::{StreamingState, middleware::AppState, router as api_router, streaming::BroadcastEventPublisher};
use haven_common::ReportCipher;
use haven_core::{
    AlertDispatcher, EmailService, EscalationScanner, MediaService, NotificationBuffer,
    NotificationKind, ReportService, SmsService,
};
use haven_db::repositories::{MediaRepository, ReportRepository};
use sea_orm::{DatabaseBackend, MockDatabase};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

/// Create test app state with a mock database.
fn create_test_state() -> AppState {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let report_repo = ReportRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));

    let cipher = Arc::new(ReportCipher::new([1u8; 32]));
    let buffer = NotificationBuffer::new(50);
    let streaming = StreamingState::new();
    let publisher = Arc::new(BroadcastEventPublisher::new(streaming.clone()));

    let dispatcher = AlertDispatcher::new(
        publisher,
        buffer.clone(),
        SmsService::new(None),
        EmailService::new(None).unwrap(),
        None,
        None,
    );

    let report_service = ReportService::new(report_repo.clone(), cipher, dispatcher.clone());
    let media_service = MediaService::new(media_repo, 256 * 1024, 256 * 1024 * 1024);
    let escalation_scanner = EscalationScanner::new(report_repo, 2);

    AppState {
        report_service,
        media_service,
        escalation_scanner,
        alert_dispatcher: dispatcher,
        notification_buffer: buffer,
        streaming,
        admin_token: Some(ADMIN_TOKEN.to_string()),
    }
}

fn test_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .with_state(state)
}

fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
    req.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_poll_requires_admin_token() {
    let app = test_app(create_test_state());

    let response = app
        .oneshot(Request::builder().uri("/api/poll").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_poll_drains_buffer_once() {
    let state = create_test_state();
    let app = test_app(state.clone());

    state
        .notification_buffer
        .append(NotificationKind::UrgentReport, serde_json::json!({"shortId": "ABCD2345"}))
        .await;

    let response = app
        .clone()
        .oneshot(
            authed(Request::builder().uri("/api/poll"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["type"], "urgent_report");

    // A second poll sees nothing: at-most-once per poll
    let response = app
        .oneshot(
            authed(Request::builder().uri("/api/poll"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_poll_status_reports_buffer_health() {
    let state = create_test_state();
    let app = test_app(state.clone());

    state
        .notification_buffer
        .append(NotificationKind::NewReport, serde_json::json!({}))
        .await;

    let response = app
        .oneshot(
            authed(Request::builder().uri("/api/poll/status"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["undelivered"], 1);
    assert_eq!(json["capacity"], 50);
}

#[tokio::test]
async fn test_poll_cleanup_purges_delivered() {
    let state = create_test_state();
    let app = test_app(state.clone());

    state
        .notification_buffer
        .append(NotificationKind::NewReport, serde_json::json!({}))
        .await;
    state.notification_buffer.drain().await;

    let response = app
        .oneshot(
            authed(Request::builder().uri("/api/poll/cleanup").method("POST"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["removed"], 1);
}

#[tokio::test]
async fn test_submit_with_unsupported_media_type_is_rejected() {
    let app = test_app(create_test_state());

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"message\"\r\n\r\n\
        something happened\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"category\"\r\n\r\n\
        safety\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"severity\"\r\n\r\n\
        low\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"photo\"; filename=\"doc.pdf\"\r\n\
        Content-Type: application/pdf\r\n\r\n\
        %PDF-1.4 fake\r\n\
        --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .method("POST")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    // Rejected before any record or media row is created
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNSUPPORTED_MEDIA");
}

#[tokio::test]
async fn test_submit_without_message_is_rejected() {
    let app = test_app(create_test_state());

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"category\"\r\n\r\n\
        safety\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"severity\"\r\n\r\n\
        low\r\n\
        --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .method("POST")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_channels_status_hidden_from_unauthenticated() {
    let app = test_app(create_test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/channels")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_channels_status_reflects_configuration() {
    let app = test_app(create_test_state());

    let response = app
        .oneshot(
            authed(Request::builder().uri("/api/admin/channels"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["push"], true);
    assert_eq!(json["fallbackBuffer"], true);
    assert_eq!(json["sms"], false);
    assert_eq!(json["email"], false);
}

#[tokio::test]
async fn test_channel_test_reports_not_configured() {
    let app = test_app(create_test_state());

    let response = app
        .oneshot(
            authed(Request::builder().uri("/api/admin/channels/test").method("POST"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let outcomes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(outcomes, vec!["not_configured", "not_configured"]);
}
