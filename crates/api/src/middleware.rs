//! API middleware.

#![allow(missing_docs)]

use haven_core::{
    AlertDispatcher, EscalationScanner, MediaService, NotificationBuffer, ReportService,
};

use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub media_service: MediaService,
    pub escalation_scanner: EscalationScanner,
    pub alert_dispatcher: AlertDispatcher,
    pub notification_buffer: NotificationBuffer,
    pub streaming: StreamingState,
    /// Bearer token for admin routes; admin access is rejected when unset.
    pub admin_token: Option<String>,
}
