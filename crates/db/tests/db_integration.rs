//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `haven_test`)
//!   `TEST_DB_PASSWORD` (default: `haven_test`)
//!   `TEST_DB_NAME` (default: `haven_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use haven_db::entities::report::{self, ReportCategory, ReportSeverity, ReportStatus};
use haven_db::repositories::ReportRepository;
use haven_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

fn report_model(
    id: &str,
    severity: ReportSeverity,
    status: ReportStatus,
    age_hours: i64,
) -> report::ActiveModel {
    report::ActiveModel {
        id: Set(id.to_string()),
        short_id: Set(format!("C{id}")),
        encrypted_message: Set("Y2lwaGVydGV4dA==".to_string()),
        encryption_iv: Set("aXY=".to_string()),
        encryption_auth_tag: Set("dGFn".to_string()),
        category: Set(ReportCategory::Safety),
        severity: Set(severity),
        status: Set(status),
        photo_file_id: Set(None),
        video_file_id: Set(None),
        additional_media_ids: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        accuracy: Set(None),
        address: Set(None),
        admin_notes: Set(None),
        admin_response: Set(None),
        created_at: Set((Utc::now() - Duration::hours(age_hours)).into()),
        resolved_at: Set(None),
        escalated_at: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_escalation_query_filters_status_and_age() {
    let db = TestDatabase::create_unique().await.unwrap();
    haven_db::migrate(db.connection()).await.unwrap();

    let repo = ReportRepository::new(Arc::new(db.conn.clone()));

    // 3h old, urgent, still pending: must appear
    repo.create(report_model("a1", ReportSeverity::Urgent, ReportStatus::Pending, 3))
        .await
        .unwrap();
    // Same age, resolved: must not appear
    repo.create(report_model("a2", ReportSeverity::Urgent, ReportStatus::Resolved, 3))
        .await
        .unwrap();
    // Fresh urgent pending: under threshold
    repo.create(report_model("a3", ReportSeverity::Urgent, ReportStatus::Pending, 0))
        .await
        .unwrap();
    // Old but low severity
    repo.create(report_model("a4", ReportSeverity::Low, ReportStatus::Pending, 3))
        .await
        .unwrap();

    let cutoff = Utc::now() - Duration::hours(2);
    let hits = repo.find_needing_escalation(cutoff).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a1");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_short_id_lookup() {
    let db = TestDatabase::create_unique().await.unwrap();
    haven_db::migrate(db.connection()).await.unwrap();

    let repo = ReportRepository::new(Arc::new(db.conn.clone()));
    let created = repo
        .create(report_model("b1", ReportSeverity::Low, ReportStatus::Pending, 0))
        .await
        .unwrap();

    let found = repo.find_by_short_id(&created.short_id).await.unwrap();
    assert_eq!(found.map(|r| r.id), Some("b1".to_string()));

    assert!(repo.short_id_exists(&created.short_id).await.unwrap());
    assert!(!repo.short_id_exists("ZZZZ9999").await.unwrap());

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
