//! Report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    #[sea_orm(string_value = "harassment")]
    Harassment,
    #[sea_orm(string_value = "medical")]
    Medical,
    #[sea_orm(string_value = "emergency")]
    Emergency,
    #[sea_orm(string_value = "safety")]
    Safety,
    #[sea_orm(string_value = "feedback")]
    Feedback,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ReportCategory {
    /// Canonical string value, matching the persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "harassment",
            Self::Medical => "medical",
            Self::Emergency => "emergency",
            Self::Safety => "safety",
            Self::Feedback => "feedback",
            Self::Other => "other",
        }
    }
}

/// Report severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReportSeverity {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl ReportSeverity {
    /// Canonical string value, matching the persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Report lifecycle states.
///
/// Transitions are monotonic: `pending → in_progress → reviewed|flagged →
/// resolved`, with `escalated` reachable from `pending`/`in_progress` only.
/// An escalated report still requires eventual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    #[sea_orm(string_value = "flagged")]
    Flagged,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "escalated")]
    Escalated,
}

impl ReportStatus {
    /// Canonical string value, matching the persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Reviewed => "reviewed",
            Self::Flagged => "flagged",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
        }
    }

    /// Whether a report in this state may still be escalated.
    #[must_use]
    pub const fn can_escalate(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Short human-shareable code; unique and immutable once assigned.
    #[sea_orm(unique)]
    pub short_id: String,

    /// Encrypted message body, base64. Plaintext is never persisted.
    #[sea_orm(column_type = "Text")]
    pub encrypted_message: String,

    /// Per-record encryption nonce, base64.
    pub encryption_iv: String,

    /// Detached authentication tag, base64.
    pub encryption_auth_tag: String,

    pub category: ReportCategory,

    pub severity: ReportSeverity,

    pub status: ReportStatus,

    /// Weak reference into the images bucket; no cascade delete.
    #[sea_orm(nullable)]
    pub photo_file_id: Option<String>,

    /// Weak reference into the videos bucket; no cascade delete.
    #[sea_orm(nullable)]
    pub video_file_id: Option<String>,

    /// Ordered list of further media ids (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub additional_media_ids: Option<Json>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    /// Reported location accuracy in meters.
    #[sea_orm(nullable)]
    pub accuracy: Option<f64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,

    /// Response shown to the submitter on status lookup.
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_response: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub escalated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// All media ids referenced by this report, photo first, in order.
    #[must_use]
    pub fn media_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(ref id) = self.photo_file_id {
            ids.push(id.clone());
        }
        if let Some(ref id) = self.video_file_id {
            ids.push(id.clone());
        }
        if let Some(ref extra) = self.additional_media_ids
            && let Some(array) = extra.as_array()
        {
            ids.extend(array.iter().filter_map(|v| v.as_str().map(String::from)));
        }
        ids
    }

    /// Whether this report carries any media reference.
    #[must_use]
    pub fn has_media(&self) -> bool {
        !self.media_ids().is_empty()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(additional: Option<Json>) -> Model {
        Model {
            id: "01hx".into(),
            short_id: "ABCD2345".into(),
            encrypted_message: String::new(),
            encryption_iv: String::new(),
            encryption_auth_tag: String::new(),
            category: ReportCategory::Safety,
            severity: ReportSeverity::Low,
            status: ReportStatus::Pending,
            photo_file_id: Some("p1".into()),
            video_file_id: None,
            additional_media_ids: additional,
            latitude: None,
            longitude: None,
            accuracy: None,
            address: None,
            admin_notes: None,
            admin_response: None,
            created_at: chrono::Utc::now().into(),
            resolved_at: None,
            escalated_at: None,
        }
    }

    #[test]
    fn test_media_ids_ordering() {
        let report = sample(Some(serde_json::json!(["m1", "m2"])));
        assert_eq!(report.media_ids(), vec!["p1", "m1", "m2"]);
    }

    #[test]
    fn test_media_ids_empty() {
        let mut report = sample(None);
        report.photo_file_id = None;
        assert!(report.media_ids().is_empty());
        assert!(!report.has_media());
    }

    #[test]
    fn test_can_escalate() {
        assert!(ReportStatus::Pending.can_escalate());
        assert!(ReportStatus::InProgress.can_escalate());
        assert!(!ReportStatus::Resolved.can_escalate());
        assert!(!ReportStatus::Escalated.can_escalate());
    }
}
