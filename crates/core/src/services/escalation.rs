//! Escalation scanner.
//!
//! Identifies urgent reports left unprocessed past the configured age
//! threshold. The scanner is read-only; the caller (the server's periodic
//! sweep, or an admin endpoint) decides whether to transition hits to
//! `escalated` and re-trigger the alert dispatcher.

use chrono::{DateTime, Duration, Utc};

use haven_common::AppResult;
use haven_db::{entities::report, repositories::ReportRepository};

/// Escalation scanner service.
#[derive(Clone)]
pub struct EscalationScanner {
    repo: ReportRepository,
    threshold_hours: i64,
}

impl EscalationScanner {
    /// Create a scanner with the given age threshold in hours.
    #[must_use]
    pub const fn new(repo: ReportRepository, threshold_hours: i64) -> Self {
        Self {
            repo,
            threshold_hours,
        }
    }

    /// The configured age threshold in hours.
    #[must_use]
    pub const fn threshold_hours(&self) -> i64 {
        self.threshold_hours
    }

    /// Cutoff timestamp: reports created before this are overdue.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.threshold_hours)
    }

    /// Reports needing escalation, oldest first: urgent severity, still
    /// `pending` or `in_progress`, older than the threshold.
    pub async fn find_needing_escalation(&self) -> AppResult<Vec<report::Model>> {
        let cutoff = self.cutoff(Utc::now());
        let hits = self.repo.find_needing_escalation(cutoff).await?;

        if !hits.is_empty() {
            tracing::warn!(count = hits.len(), "Reports overdue for escalation");
        }

        Ok(hits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn scanner(threshold_hours: i64) -> EscalationScanner {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        EscalationScanner::new(ReportRepository::new(db), threshold_hours)
    }

    #[test]
    fn test_cutoff_subtracts_threshold() {
        let s = scanner(2);
        let now = Utc::now();
        assert_eq!(s.cutoff(now), now - Duration::hours(2));
    }

    #[test]
    fn test_threshold_is_configurable() {
        assert_eq!(scanner(3).threshold_hours(), 3);
        assert_eq!(scanner(2).threshold_hours(), 2);
    }
}
