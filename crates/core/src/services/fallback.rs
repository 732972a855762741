//! Notification fallback buffer.
//!
//! Bounded in-memory queue of notification events for polling clients that
//! cannot hold a push connection. Every dispatch appends here regardless of
//! push delivery; the push and polling paths are intentionally independent
//! at-least-once channels with no dedup between them.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use haven_common::IdGenerator;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Notification event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewReport,
    UrgentReport,
    ReportUpdated,
}

impl NotificationKind {
    /// Canonical string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewReport => "new_report",
            Self::UrgentReport => "urgent_report",
            Self::ReportUpdated => "report_updated",
        }
    }
}

/// A buffered notification event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Event ID.
    pub id: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Structured event payload.
    pub payload: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether a polling client has already retrieved this event.
    pub delivered: bool,
}

/// Buffer health, exposed on the polling boundary.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStatus {
    /// Events currently held, delivered or not.
    pub total: usize,
    /// Events not yet retrieved by a polling client.
    pub undelivered: usize,
    /// Capacity bound; the oldest events are evicted beyond this.
    pub capacity: usize,
}

struct Inner {
    events: VecDeque<NotificationEvent>,
    capacity: usize,
}

/// Bounded fallback buffer with at-most-once delivery per poll.
///
/// `append`, `drain` and `cleanup` serialize on one mutex, so a polling
/// client never observes a partially marked batch.
#[derive(Clone)]
pub struct NotificationBuffer {
    inner: Arc<Mutex<Inner>>,
    id_gen: IdGenerator,
}

impl NotificationBuffer {
    /// Create a buffer with the given capacity bound.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity),
                capacity,
            })),
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an event to the tail, evicting from the head beyond capacity.
    ///
    /// Eviction is unconditional on capacity: already-delivered entries are
    /// evicted the same as undelivered ones.
    pub async fn append(&self, kind: NotificationKind, payload: serde_json::Value) -> NotificationEvent {
        let event = NotificationEvent {
            id: self.id_gen.generate(),
            kind,
            payload,
            created_at: Utc::now(),
            delivered: false,
        };

        let mut inner = self.inner.lock().await;
        inner.events.push_back(event.clone());
        while inner.events.len() > inner.capacity {
            if let Some(evicted) = inner.events.pop_front() {
                tracing::debug!(event_id = %evicted.id, "Evicted oldest notification event");
            }
        }

        event
    }

    /// Return all undelivered events, marking them delivered in the same
    /// call. Two successive drains never return overlapping events; a
    /// client that crashes after a drain loses that batch.
    pub async fn drain(&self) -> Vec<NotificationEvent> {
        let mut inner = self.inner.lock().await;
        let mut batch = Vec::new();
        for event in inner.events.iter_mut().filter(|e| !e.delivered) {
            event.delivered = true;
            batch.push(event.clone());
        }
        batch
    }

    /// Remove all delivered events, compacting memory. Returns the number
    /// removed.
    pub async fn cleanup(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let before = inner.events.len();
        inner.events.retain(|e| !e.delivered);
        before - inner.events.len()
    }

    /// Current buffer health.
    pub async fn status(&self) -> BufferStatus {
        let inner = self.inner.lock().await;
        BufferStatus {
            total: inner.events.len(),
            undelivered: inner.events.iter().filter(|e| !e.delivered).count(),
            capacity: inner.capacity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_drain_marks_delivered() {
        let buffer = NotificationBuffer::new(50);
        buffer.append(NotificationKind::NewReport, json!({"n": 1})).await;
        buffer.append(NotificationKind::UrgentReport, json!({"n": 2})).await;

        let first = buffer.drain().await;
        assert_eq!(first.len(), 2);

        // Second drain sees nothing: non-overlapping batches
        let second = buffer.drain().await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_drain_twice_non_overlapping() {
        let buffer = NotificationBuffer::new(50);
        buffer.append(NotificationKind::NewReport, json!({"n": 1})).await;

        let first = buffer.drain().await;
        buffer.append(NotificationKind::NewReport, json!({"n": 2})).await;
        let second = buffer.drain().await;

        let first_ids: Vec<_> = first.iter().map(|e| e.id.clone()).collect();
        assert_eq!(second.len(), 1);
        assert!(!first_ids.contains(&second[0].id));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_first() {
        let buffer = NotificationBuffer::new(50);
        for n in 0..60 {
            buffer.append(NotificationKind::NewReport, json!({"n": n})).await;
        }

        let status = buffer.status().await;
        assert_eq!(status.total, 50);

        let events = buffer.drain().await;
        assert_eq!(events.len(), 50);
        // Oldest ten were evicted
        assert_eq!(events[0].payload["n"], 10);
        assert_eq!(events[49].payload["n"], 59);
    }

    #[tokio::test]
    async fn test_eviction_ignores_delivered_flag() {
        let buffer = NotificationBuffer::new(3);
        buffer.append(NotificationKind::NewReport, json!({"n": 0})).await;
        buffer.drain().await; // n=0 delivered

        for n in 1..=3 {
            buffer.append(NotificationKind::NewReport, json!({"n": n})).await;
        }

        // Capacity 3: delivered n=0 evicted along with nothing else
        let status = buffer.status().await;
        assert_eq!(status.total, 3);
        assert_eq!(status.undelivered, 3);
    }

    #[tokio::test]
    async fn test_cleanup_removes_delivered_only() {
        let buffer = NotificationBuffer::new(50);
        buffer.append(NotificationKind::NewReport, json!({"n": 1})).await;
        buffer.drain().await;
        buffer.append(NotificationKind::NewReport, json!({"n": 2})).await;

        let removed = buffer.cleanup().await;
        assert_eq!(removed, 1);

        let status = buffer.status().await;
        assert_eq!(status.total, 1);
        assert_eq!(status.undelivered, 1);
    }

    #[tokio::test]
    async fn test_status_reports_capacity() {
        let buffer = NotificationBuffer::new(7);
        let status = buffer.status().await;
        assert_eq!(status.capacity, 7);
        assert_eq!(status.total, 0);
    }
}
