//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportSeverity, ReportStatus},
};
use haven_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Find a report by its short share code.
    pub async fn find_by_short_id(&self, short_id: &str) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::ShortId.eq(short_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a short share code is already assigned.
    pub async fn short_id_exists(&self, short_id: &str) -> AppResult<bool> {
        let count = Report::find()
            .filter(report::Column::ShortId.eq(short_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Apply an update.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports older than `cutoff` that are still unresolved and urgent,
    /// oldest first.
    ///
    /// Read-only; callers decide whether to transition the hits.
    pub async fn find_needing_escalation(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::Severity.eq(ReportSeverity::Urgent))
            .filter(
                report::Column::Status
                    .is_in([ReportStatus::Pending, ReportStatus::InProgress]),
            )
            .filter(report::Column::CreatedAt.lt(cutoff))
            .order_by_asc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every media id referenced by any report, for orphan detection.
    pub async fn list_referenced_media_ids(&self) -> AppResult<Vec<String>> {
        let reports = Report::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(reports.iter().flat_map(report::Model::media_ids).collect())
    }
}
