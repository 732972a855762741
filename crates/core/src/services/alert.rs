//! Alert dispatcher.
//!
//! Fans a report event out to every applicable channel with per-channel
//! failure isolation: one channel failing never blocks another, and no
//! channel outcome ever fails the report write that triggered the dispatch.
//!
//! Channel selection:
//! - every event: real-time push (best-effort) and the fallback buffer
//!   (guaranteed-visible to polling clients)
//! - urgent events additionally attempt SMS and email, independently and
//!   in no guaranteed order
//!
//! There is no retry queue; a failed attempt is logged and recorded in the
//! dispatch summary only.

use chrono::Utc;
use haven_db::entities::report::{self, ReportCategory, ReportSeverity};
use serde::Serialize;

use haven_common::AppError;

use crate::services::email::EmailService;
use crate::services::event_publisher::{AlertEvent, EventPublisherService};
use crate::services::fallback::{NotificationBuffer, NotificationKind};
use crate::services::sms::SmsService;

/// Classify whether a report demands the urgent channel set.
#[must_use]
pub const fn is_urgent(severity: ReportSeverity, category: ReportCategory) -> bool {
    matches!(severity, ReportSeverity::Urgent)
        || matches!(category, ReportCategory::Medical | ReportCategory::Emergency)
}

/// Alert delivery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Push,
    FallbackBuffer,
    Sms,
    Email,
}

impl AlertChannel {
    /// Canonical string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::FallbackBuffer => "fallback_buffer",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

/// Outcome of one channel attempt.
///
/// `NotConfigured` (missing credentials, nothing attempted) is distinct
/// from `Failed` (attempted and errored) and is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOutcome {
    Success,
    Failed,
    NotConfigured,
}

impl ChannelOutcome {
    /// Canonical string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::NotConfigured => "not_configured",
        }
    }
}

/// One recorded channel attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAttempt {
    /// Channel attempted.
    pub channel: AlertChannel,
    /// Outcome of the attempt.
    pub outcome: ChannelOutcome,
    /// Failure detail, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregated outcomes of one dispatch, for observability only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    /// Report the dispatch was for.
    pub report_id: String,
    /// Event kind dispatched.
    pub kind: NotificationKind,
    /// Whether the urgent channel set was selected.
    pub urgent: bool,
    /// Per-channel outcomes.
    pub attempts: Vec<ChannelAttempt>,
}

impl DispatchSummary {
    /// Outcome recorded for a channel, if it was attempted.
    #[must_use]
    pub fn outcome_for(&self, channel: AlertChannel) -> Option<ChannelOutcome> {
        self.attempts
            .iter()
            .find(|a| a.channel == channel)
            .map(|a| a.outcome)
    }
}

/// Per-channel configuration state, for admin diagnostics only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsStatus {
    /// Push is always available (in-process broadcast).
    pub push: bool,
    /// Fallback buffer is always available (in-process).
    pub fallback_buffer: bool,
    /// Whether SMS credentials and a destination number are configured.
    pub sms: bool,
    /// Whether SMTP and a destination address are configured.
    pub email: bool,
}

/// Alert dispatcher service.
#[derive(Clone)]
pub struct AlertDispatcher {
    publisher: EventPublisherService,
    buffer: NotificationBuffer,
    sms: SmsService,
    email: EmailService,
    admin_phone: Option<String>,
    admin_email: Option<String>,
}

impl AlertDispatcher {
    /// Create a new dispatcher over the given channels.
    #[must_use]
    pub const fn new(
        publisher: EventPublisherService,
        buffer: NotificationBuffer,
        sms: SmsService,
        email: EmailService,
        admin_phone: Option<String>,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            publisher,
            buffer,
            sms,
            email,
            admin_phone,
            admin_email,
        }
    }

    /// Dispatch alerts for a newly submitted report.
    pub async fn dispatch_new(&self, report: &report::Model) -> DispatchSummary {
        let urgent = is_urgent(report.severity, report.category);
        let kind = if urgent {
            NotificationKind::UrgentReport
        } else {
            NotificationKind::NewReport
        };
        self.dispatch(report, kind, urgent).await
    }

    /// Dispatch alerts for an updated report.
    ///
    /// Updates are not a new urgency classification: only push and the
    /// fallback buffer are notified, regardless of severity.
    pub async fn dispatch_updated(&self, report: &report::Model) -> DispatchSummary {
        self.dispatch(report, NotificationKind::ReportUpdated, false).await
    }

    /// Re-dispatch a report that was force-escalated, with the urgent
    /// channel set.
    pub async fn dispatch_escalation(&self, report: &report::Model) -> DispatchSummary {
        self.dispatch(report, NotificationKind::UrgentReport, true).await
    }

    /// Current per-channel configuration state.
    #[must_use]
    pub fn channels_status(&self) -> ChannelsStatus {
        ChannelsStatus {
            push: true,
            fallback_buffer: true,
            sms: self.sms.is_enabled() && self.admin_phone.is_some(),
            email: self.email.is_enabled() && self.admin_email.is_some(),
        }
    }

    /// Attempt a test delivery on the urgent channels, for the admin
    /// diagnostics endpoint.
    pub async fn send_test(&self) -> Vec<ChannelAttempt> {
        let body = "Haven alert channel test";
        let (sms, email) = tokio::join!(
            self.attempt_sms_message(body),
            self.attempt_email_message("Haven channel test", body),
        );
        vec![sms, email]
    }

    async fn dispatch(
        &self,
        report: &report::Model,
        kind: NotificationKind,
        urgent: bool,
    ) -> DispatchSummary {
        let event = AlertEvent {
            kind,
            report_id: report.id.clone(),
            short_id: report.short_id.clone(),
            category: report.category,
            severity: report.severity,
            timestamp: Utc::now(),
        };

        let mut attempts = Vec::with_capacity(if urgent { 4 } else { 2 });

        // Real-time push: best-effort, fire-and-forget
        let push_outcome = match self.publisher.publish_alert(&event).await {
            Ok(()) => ChannelAttempt {
                channel: AlertChannel::Push,
                outcome: ChannelOutcome::Success,
                detail: None,
            },
            Err(e) => {
                tracing::warn!(report_id = %report.id, error = %e, "Push publish failed");
                ChannelAttempt {
                    channel: AlertChannel::Push,
                    outcome: ChannelOutcome::Failed,
                    detail: Some(e.to_string()),
                }
            }
        };
        attempts.push(push_outcome);

        // Fallback buffer: guaranteed-visible to polling clients
        let payload = serde_json::to_value(&event).unwrap_or_default();
        self.buffer.append(kind, payload).await;
        attempts.push(ChannelAttempt {
            channel: AlertChannel::FallbackBuffer,
            outcome: ChannelOutcome::Success,
            detail: None,
        });

        if urgent {
            let sms_body = Self::format_sms(&event);
            let (subject, email_body) = Self::format_email(&event);
            let (sms, email) = tokio::join!(
                self.attempt_sms_message(&sms_body),
                self.attempt_email_message(&subject, &email_body),
            );
            attempts.push(sms);
            attempts.push(email);
        }

        let summary = DispatchSummary {
            report_id: report.id.clone(),
            kind,
            urgent,
            attempts,
        };

        for attempt in &summary.attempts {
            tracing::info!(
                report_id = %summary.report_id,
                channel = attempt.channel.as_str(),
                outcome = attempt.outcome.as_str(),
                "Alert channel attempt"
            );
        }

        summary
    }

    async fn attempt_sms_message(&self, body: &str) -> ChannelAttempt {
        let Some(to) = self.admin_phone.as_deref() else {
            return ChannelAttempt {
                channel: AlertChannel::Sms,
                outcome: ChannelOutcome::NotConfigured,
                detail: Some("no destination number".to_string()),
            };
        };

        match self.sms.send(to, body).await {
            Ok(result) if result.success => ChannelAttempt {
                channel: AlertChannel::Sms,
                outcome: ChannelOutcome::Success,
                detail: None,
            },
            Ok(result) => ChannelAttempt {
                channel: AlertChannel::Sms,
                outcome: ChannelOutcome::Failed,
                detail: result.error,
            },
            Err(AppError::ChannelNotConfigured(_)) => ChannelAttempt {
                channel: AlertChannel::Sms,
                outcome: ChannelOutcome::NotConfigured,
                detail: None,
            },
            Err(e) => ChannelAttempt {
                channel: AlertChannel::Sms,
                outcome: ChannelOutcome::Failed,
                detail: Some(e.to_string()),
            },
        }
    }

    async fn attempt_email_message(&self, subject: &str, body: &str) -> ChannelAttempt {
        let Some(to) = self.admin_email.as_deref() else {
            return ChannelAttempt {
                channel: AlertChannel::Email,
                outcome: ChannelOutcome::NotConfigured,
                detail: Some("no destination address".to_string()),
            };
        };

        match self.email.send_alert(to, subject, body).await {
            Ok(result) if result.success => ChannelAttempt {
                channel: AlertChannel::Email,
                outcome: ChannelOutcome::Success,
                detail: None,
            },
            Ok(result) => ChannelAttempt {
                channel: AlertChannel::Email,
                outcome: ChannelOutcome::Failed,
                detail: result.error,
            },
            Err(AppError::ChannelNotConfigured(_)) => ChannelAttempt {
                channel: AlertChannel::Email,
                outcome: ChannelOutcome::NotConfigured,
                detail: None,
            },
            Err(e) => ChannelAttempt {
                channel: AlertChannel::Email,
                outcome: ChannelOutcome::Failed,
                detail: Some(e.to_string()),
            },
        }
    }

    // Alert texts carry metadata only; the message body stays encrypted at
    // rest and is never sent over a channel.
    fn format_sms(event: &AlertEvent) -> String {
        format!(
            "URGENT incident report {} ({}, severity {}). Review required.",
            event.short_id,
            event.category.as_str(),
            event.severity.as_str()
        )
    }

    fn format_email(event: &AlertEvent) -> (String, String) {
        let subject = format!("Urgent incident report {}", event.short_id);
        let body = format!(
            "An incident report requires immediate attention.\n\n\
            Report: {}\nCategory: {}\nSeverity: {}\nReceived: {}\n\n\
            Log in to the admin dashboard to review it.",
            event.short_id,
            event.category.as_str(),
            event.severity.as_str(),
            event.timestamp.to_rfc3339()
        );
        (subject, body)
    }
}
