//! Media repository for the chunked object store.

use std::sync::Arc;

use crate::entities::{
    MediaChunk, MediaFile,
    media_chunk,
    media_file::{self, MediaBucket},
};
use haven_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Media repository for database operations.
///
/// Chunks are written first; the metadata row last. Readers resolve objects
/// through the metadata row, so a partially uploaded object is never
/// retrievable.
#[derive(Clone)]
pub struct MediaRepository {
    db: Arc<DatabaseConnection>,
}

impl MediaRepository {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert one chunk of an object's content.
    pub async fn insert_chunk(&self, file_id: &str, seq: i32, data: Vec<u8>) -> AppResult<()> {
        let model = media_chunk::ActiveModel {
            file_id: Set(file_id.to_string()),
            seq: Set(seq),
            data: Set(data),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert the metadata row, completing an upload.
    pub async fn insert_file(&self, model: media_file::ActiveModel) -> AppResult<media_file::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an object's metadata within a bucket.
    pub async fn find_file(
        &self,
        bucket: MediaBucket,
        id: &str,
    ) -> AppResult<Option<media_file::Model>> {
        MediaFile::find_by_id(id)
            .filter(media_file::Column::Bucket.eq(bucket))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an object's metadata within a bucket, failing if absent.
    pub async fn get_file(&self, bucket: MediaBucket, id: &str) -> AppResult<media_file::Model> {
        self.find_file(bucket, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("media {id} in bucket {}", bucket.as_str()))
        })
    }

    /// Fetch one chunk of an object by sequence number.
    pub async fn find_chunk(
        &self,
        file_id: &str,
        seq: i32,
    ) -> AppResult<Option<media_chunk::Model>> {
        MediaChunk::find()
            .filter(media_chunk::Column::FileId.eq(file_id))
            .filter(media_chunk::Column::Seq.eq(seq))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch all chunks of an object in order.
    pub async fn find_chunks(&self, file_id: &str) -> AppResult<Vec<media_chunk::Model>> {
        MediaChunk::find()
            .filter(media_chunk::Column::FileId.eq(file_id))
            .order_by_asc(media_chunk::Column::Seq)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all chunks of an object. Used both for explicit deletion and
    /// for cleaning up after an interrupted upload.
    pub async fn delete_chunks(&self, file_id: &str) -> AppResult<u64> {
        let result = MediaChunk::delete_many()
            .filter(media_chunk::Column::FileId.eq(file_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete an object's metadata row. Returns whether a row existed.
    pub async fn delete_file(&self, bucket: MediaBucket, id: &str) -> AppResult<bool> {
        let result = MediaFile::delete_many()
            .filter(media_file::Column::Id.eq(id))
            .filter(media_file::Column::Bucket.eq(bucket))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// List all objects in a bucket, oldest first.
    pub async fn list_bucket(&self, bucket: MediaBucket) -> AppResult<Vec<media_file::Model>> {
        MediaFile::find()
            .filter(media_file::Column::Bucket.eq(bucket))
            .order_by_asc(media_file::Column::UploadedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all objects across every bucket, oldest first.
    pub async fn list_all_files(&self) -> AppResult<Vec<media_file::Model>> {
        MediaFile::find()
            .order_by_asc(media_file::Column::UploadedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
