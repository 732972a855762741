//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time alert events to
//! connected admin subscribers. The actual implementation is provided by
//! the api crate (WebSocket broadcast); core services publish through the
//! trait without depending on the transport.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_common::AppResult;
use haven_db::entities::report::{ReportCategory, ReportSeverity};
use serde::Serialize;
use std::sync::Arc;

use crate::services::fallback::NotificationKind;

/// Structured event pushed to admin subscribers.
///
/// Carries report metadata only; the encrypted message body never leaves
/// the record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Report primary ID.
    pub report_id: String,
    /// Report short share code.
    pub short_id: String,
    /// Report category.
    pub category: ReportCategory,
    /// Report severity.
    pub severity: ReportSeverity,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Trait for publishing real-time alert events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an alert event to all connected subscribers. Best-effort;
    /// there is no per-subscriber acknowledgment.
    async fn publish_alert(&self, event: &AlertEvent) -> AppResult<()>;
}

/// A no-op implementation for testing or when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_alert(&self, _event: &AlertEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
