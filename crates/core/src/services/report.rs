//! Report service.
//!
//! Intake and lifecycle of incident reports. The message body is encrypted
//! before it reaches the repository; notification dispatch runs after the
//! record write and its outcome never fails the write.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use haven_common::{AppError, AppResult, EncryptedMessage, IdGenerator, ReportCipher};
use haven_db::{
    entities::report::{self, ReportCategory, ReportSeverity, ReportStatus},
    repositories::ReportRepository,
};

use crate::services::alert::{AlertDispatcher, DispatchSummary};

/// Attempts at finding an unassigned short share code before giving up.
const SHORT_ID_ATTEMPTS: usize = 5;

/// Input for submitting a new report.
///
/// Media must already be persisted; a report never references a media id
/// that does not durably exist.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReportInput {
    /// Report message text; encrypted before persistence.
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
    /// Report category.
    pub category: ReportCategory,
    /// Report severity.
    pub severity: ReportSeverity,
    /// Optional location latitude.
    pub latitude: Option<f64>,
    /// Optional location longitude.
    pub longitude: Option<f64>,
    /// Optional location accuracy in meters.
    pub accuracy: Option<f64>,
    /// Optional free-form address.
    pub address: Option<String>,
    /// Stored photo object id, if any.
    pub photo_file_id: Option<String>,
    /// Stored video object id, if any.
    pub video_file_id: Option<String>,
    /// Further stored media ids, in order.
    #[serde(default)]
    pub additional_media_ids: Vec<String>,
}

/// Input for an admin update to a report.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportInput {
    /// New status, if changing.
    pub status: Option<ReportStatus>,
    /// Internal admin notes.
    pub admin_notes: Option<String>,
    /// Response shown to the submitter on status lookup.
    pub admin_response: Option<String>,
}

/// Submitter-facing view of a report's status.
///
/// The message is included only for authorized (admin) callers.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    /// Short share code.
    pub short_id: String,
    /// Current status.
    pub status: ReportStatus,
    /// Category.
    pub category: ReportCategory,
    /// Severity.
    pub severity: ReportSeverity,
    /// Submission timestamp.
    pub created_at: String,
    /// Admin response, when one has been given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
    /// Location latitude, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Location longitude, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Location address, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Always true: the stored message is encrypted at rest.
    pub is_encrypted: bool,
    /// Decrypted message; admin callers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    cipher: Arc<ReportCipher>,
    dispatcher: AlertDispatcher,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        repo: ReportRepository,
        cipher: Arc<ReportCipher>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            repo,
            cipher,
            dispatcher,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a new report.
    ///
    /// Validates, encrypts the message, persists the record with a fresh
    /// unique short code, then dispatches alerts. Channel outcomes are
    /// logged but never fail the submission.
    pub async fn submit(&self, input: SubmitReportInput) -> AppResult<report::Model> {
        input.validate()?;

        let sealed = self.cipher.encrypt(&input.message)?;
        let short_id = self.allocate_short_id().await?;

        let additional = if input.additional_media_ids.is_empty() {
            None
        } else {
            Some(serde_json::json!(input.additional_media_ids))
        };

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            short_id: Set(short_id),
            encrypted_message: Set(sealed.ciphertext),
            encryption_iv: Set(sealed.iv),
            encryption_auth_tag: Set(sealed.auth_tag),
            category: Set(input.category),
            severity: Set(input.severity),
            status: Set(ReportStatus::Pending),
            photo_file_id: Set(input.photo_file_id),
            video_file_id: Set(input.video_file_id),
            additional_media_ids: Set(additional),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            accuracy: Set(input.accuracy),
            address: Set(input.address),
            admin_notes: Set(None),
            admin_response: Set(None),
            created_at: Set(Utc::now().into()),
            resolved_at: Set(None),
            escalated_at: Set(None),
        };

        let created = self.repo.create(model).await?;

        let summary = self.dispatcher.dispatch_new(&created).await;
        tracing::info!(
            report_id = %created.id,
            short_id = %created.short_id,
            urgent = summary.urgent,
            "Report submitted and alerts dispatched"
        );

        Ok(created)
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        self.repo.find_by_id(id).await
    }

    /// Get a report by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.repo.get_by_id(id).await
    }

    /// Get a report by its short share code, failing if absent.
    pub async fn get_by_short_id(&self, short_id: &str) -> AppResult<report::Model> {
        self.repo
            .find_by_short_id(short_id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(short_id.to_string()))
    }

    /// Apply an admin update.
    ///
    /// Any change to status or notes re-triggers a `report_updated`
    /// dispatch; this is not a new urgency classification.
    pub async fn update(&self, id: &str, input: UpdateReportInput) -> AppResult<report::Model> {
        input.validate()?;
        let current = self.repo.get_by_id(id).await?;

        let changed = input.status.is_some()
            || input.admin_notes.is_some()
            || input.admin_response.is_some();

        let mut model: report::ActiveModel = current.clone().into();

        if let Some(status) = input.status {
            if status == ReportStatus::Escalated && !current.status.can_escalate() {
                return Err(AppError::BadRequest(format!(
                    "Cannot escalate a report in status {}",
                    current.status.as_str()
                )));
            }
            model.status = Set(status);
            match status {
                ReportStatus::Resolved => model.resolved_at = Set(Some(Utc::now().into())),
                ReportStatus::Escalated => model.escalated_at = Set(Some(Utc::now().into())),
                _ => {}
            }
        }
        if let Some(notes) = input.admin_notes {
            model.admin_notes = Set(Some(notes));
        }
        if let Some(response) = input.admin_response {
            model.admin_response = Set(Some(response));
        }

        let updated = self.repo.update(model).await?;

        if changed {
            self.dispatcher.dispatch_updated(&updated).await;
        }

        Ok(updated)
    }

    /// Force-escalate a report and re-dispatch with the urgent channel set.
    ///
    /// Only reports still `pending` or `in_progress` can be escalated.
    pub async fn escalate(&self, id: &str) -> AppResult<(report::Model, DispatchSummary)> {
        let current = self.repo.get_by_id(id).await?;

        if !current.status.can_escalate() {
            return Err(AppError::BadRequest(format!(
                "Cannot escalate a report in status {}",
                current.status.as_str()
            )));
        }

        let mut model: report::ActiveModel = current.into();
        model.status = Set(ReportStatus::Escalated);
        model.escalated_at = Set(Some(Utc::now().into()));

        let updated = self.repo.update(model).await?;
        let summary = self.dispatcher.dispatch_escalation(&updated).await;

        tracing::warn!(
            report_id = %updated.id,
            short_id = %updated.short_id,
            "Report force-escalated"
        );

        Ok((updated, summary))
    }

    /// Decrypt a report's message body.
    ///
    /// A tag mismatch is surfaced as a decryption error, never as garbage
    /// plaintext.
    pub fn decrypt_message(&self, report: &report::Model) -> AppResult<String> {
        self.cipher.decrypt(&EncryptedMessage {
            ciphertext: report.encrypted_message.clone(),
            iv: report.encryption_iv.clone(),
            auth_tag: report.encryption_auth_tag.clone(),
        })
    }

    /// Build the status view for a report, decrypting the message only for
    /// authorized callers.
    pub fn status_view(&self, report: &report::Model, authorized: bool) -> AppResult<StatusView> {
        let message = if authorized {
            Some(self.decrypt_message(report)?)
        } else {
            None
        };

        Ok(StatusView {
            short_id: report.short_id.clone(),
            status: report.status,
            category: report.category,
            severity: report.severity,
            created_at: report.created_at.to_rfc3339(),
            admin_response: report.admin_response.clone(),
            latitude: report.latitude,
            longitude: report.longitude,
            address: report.address.clone(),
            is_encrypted: true,
            message,
        })
    }

    /// Every media id referenced by any report, for orphan detection.
    pub async fn referenced_media_ids(&self) -> AppResult<Vec<String>> {
        self.repo.list_referenced_media_ids().await
    }

    async fn allocate_short_id(&self) -> AppResult<String> {
        for _ in 0..SHORT_ID_ATTEMPTS {
            let candidate = self.id_gen.generate_short_code();
            if !self.repo.short_id_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "Failed to allocate a unique short code".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_input_validation() {
        let input = SubmitReportInput {
            message: String::new(),
            category: ReportCategory::Safety,
            severity: ReportSeverity::Low,
            latitude: None,
            longitude: None,
            accuracy: None,
            address: None,
            photo_file_id: None,
            video_file_id: None,
            additional_media_ids: Vec::new(),
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_status_view_redacts_message_for_unauthorized() {
        let cipher = Arc::new(ReportCipher::new([9u8; 32]));
        let sealed = cipher.encrypt("sensitive detail").unwrap();

        let report = report::Model {
            id: "01hx".into(),
            short_id: "ABCD2345".into(),
            encrypted_message: sealed.ciphertext,
            encryption_iv: sealed.iv,
            encryption_auth_tag: sealed.auth_tag,
            category: ReportCategory::Harassment,
            severity: ReportSeverity::High,
            status: ReportStatus::Pending,
            photo_file_id: None,
            video_file_id: None,
            additional_media_ids: None,
            latitude: None,
            longitude: None,
            accuracy: None,
            address: None,
            admin_notes: None,
            admin_response: None,
            created_at: Utc::now().into(),
            resolved_at: None,
            escalated_at: None,
        };

        let service = test_service(cipher);

        let public = service.status_view(&report, false).unwrap();
        assert!(public.message.is_none());
        assert!(public.is_encrypted);

        let admin = service.status_view(&report, true).unwrap();
        assert_eq!(admin.message.as_deref(), Some("sensitive detail"));
    }

    #[test]
    fn test_decrypt_tampered_tag_surfaces_error() {
        let cipher = Arc::new(ReportCipher::new([9u8; 32]));
        let sealed = cipher.encrypt("original").unwrap();

        let report = report::Model {
            id: "01hx".into(),
            short_id: "ABCD2345".into(),
            encrypted_message: sealed.ciphertext,
            encryption_iv: sealed.iv,
            // Valid base64, wrong tag
            encryption_auth_tag: "AAAAAAAAAAAAAAAAAAAAAA==".into(),
            category: ReportCategory::Other,
            severity: ReportSeverity::Low,
            status: ReportStatus::Pending,
            photo_file_id: None,
            video_file_id: None,
            additional_media_ids: None,
            latitude: None,
            longitude: None,
            accuracy: None,
            address: None,
            admin_notes: None,
            admin_response: None,
            created_at: Utc::now().into(),
            resolved_at: None,
            escalated_at: None,
        };

        let service = test_service(cipher);
        assert!(matches!(
            service.decrypt_message(&report),
            Err(AppError::Decryption(_))
        ));
    }

    fn test_service(cipher: Arc<ReportCipher>) -> ReportService {
        use crate::services::alert::AlertDispatcher;
        use crate::services::email::EmailService;
        use crate::services::event_publisher::NoOpEventPublisher;
        use crate::services::fallback::NotificationBuffer;
        use crate::services::sms::SmsService;
        use sea_orm::{DatabaseBackend, MockDatabase};

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        let repo = ReportRepository::new(db);
        let dispatcher = AlertDispatcher::new(
            Arc::new(NoOpEventPublisher),
            NotificationBuffer::new(50),
            SmsService::new(None),
            EmailService::new(None).unwrap(),
            None,
            None,
        );
        ReportService::new(repo, cipher, dispatcher)
    }
}
