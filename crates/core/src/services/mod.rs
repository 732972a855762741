//! Business logic services.

#![allow(missing_docs)]

pub mod alert;
pub mod email;
pub mod escalation;
pub mod event_publisher;
pub mod fallback;
pub mod media;
pub mod report;
pub mod sms;

pub use alert::{
    AlertChannel, AlertDispatcher, ChannelAttempt, ChannelOutcome, ChannelsStatus,
    DispatchSummary, is_urgent,
};
pub use email::{EmailDeliveryResult, EmailService};
pub use escalation::EscalationScanner;
pub use event_publisher::{AlertEvent, EventPublisher, EventPublisherService, NoOpEventPublisher};
pub use fallback::{BufferStatus, NotificationBuffer, NotificationEvent, NotificationKind};
pub use media::{MediaService, UploadMediaInput};
pub use report::{ReportService, StatusView, SubmitReportInput, UpdateReportInput};
pub use sms::{SmsDeliveryResult, SmsService};
