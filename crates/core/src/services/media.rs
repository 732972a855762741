//! Media store service.
//!
//! Chunked binary object storage on top of the database, organized into
//! typed buckets. Content is written in fixed-size chunks, with the
//! metadata row inserted last: completion is atomic from the caller's
//! perspective and partial uploads are never retrievable. A stream
//! interruption cleans up the chunks already written and surfaces a
//! storage error.

use std::collections::HashSet;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream, stream::BoxStream};
use sea_orm::Set;
use serde_json::Value as Json;

use haven_common::{AppError, AppResult, IdGenerator};
use haven_db::{
    entities::media_file::{self, MediaBucket},
    repositories::MediaRepository,
};

/// Input for storing a new media object.
pub struct UploadMediaInput {
    /// Original file name.
    pub filename: String,
    /// MIME type; selects the bucket and is rejected before any bytes are
    /// written when unrecognized.
    pub mime_type: String,
    /// Free-form metadata, e.g. the originating report linkage hint.
    pub metadata: Option<Json>,
}

/// Media store service.
#[derive(Clone)]
pub struct MediaService {
    repo: MediaRepository,
    id_gen: IdGenerator,
    chunk_size: usize,
    max_size: i64,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub const fn new(repo: MediaRepository, chunk_size: usize, max_size: i64) -> Self {
        Self {
            repo,
            id_gen: IdGenerator::new(),
            chunk_size,
            max_size,
        }
    }

    /// Store an object from a byte stream.
    ///
    /// The bucket is selected by MIME prefix; unrecognized types fail with
    /// [`AppError::UnsupportedMedia`] before any bytes are written. A failed
    /// stream item aborts the upload, deletes the chunks already written and
    /// fails with [`AppError::Storage`].
    pub async fn upload_stream<S>(
        &self,
        input: UploadMediaInput,
        mut content: S,
    ) -> AppResult<media_file::Model>
    where
        S: Stream<Item = AppResult<Bytes>> + Unpin,
    {
        let bucket = MediaBucket::for_mime(&input.mime_type)
            .ok_or_else(|| AppError::UnsupportedMedia(input.mime_type.clone()))?;

        let file_id = self.id_gen.generate();
        let mut pending: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut seq: i32 = 0;
        let mut total: i64 = 0;

        while let Some(item) = content.next().await {
            let bytes = match item {
                Ok(b) => b,
                Err(e) => {
                    self.cleanup_partial(&file_id).await;
                    return Err(AppError::Storage(format!("Upload stream interrupted: {e}")));
                }
            };

            total += bytes.len() as i64;
            if total > self.max_size {
                self.cleanup_partial(&file_id).await;
                return Err(AppError::BadRequest(format!(
                    "File too large. Maximum size is {} bytes",
                    self.max_size
                )));
            }

            pending.extend_from_slice(&bytes);
            while pending.len() >= self.chunk_size {
                let chunk: Vec<u8> = pending.drain(..self.chunk_size).collect();
                if let Err(e) = self.repo.insert_chunk(&file_id, seq, chunk).await {
                    self.cleanup_partial(&file_id).await;
                    return Err(AppError::Storage(format!("Chunk write failed: {e}")));
                }
                seq += 1;
            }
        }

        if total == 0 {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }

        if !pending.is_empty() {
            let chunk = std::mem::take(&mut pending);
            if let Err(e) = self.repo.insert_chunk(&file_id, seq, chunk).await {
                self.cleanup_partial(&file_id).await;
                return Err(AppError::Storage(format!("Chunk write failed: {e}")));
            }
        }

        // Metadata row last: the object only becomes retrievable once all
        // chunks are durable.
        let model = media_file::ActiveModel {
            id: Set(file_id.clone()),
            bucket: Set(bucket),
            filename: Set(input.filename),
            mime_type: Set(input.mime_type),
            size_bytes: Set(total),
            metadata: Set(input.metadata),
            uploaded_at: Set(chrono::Utc::now().into()),
        };

        match self.repo.insert_file(model).await {
            Ok(file) => {
                tracing::debug!(
                    file_id = %file.id,
                    bucket = bucket.as_str(),
                    size = total,
                    "Stored media object"
                );
                Ok(file)
            }
            Err(e) => {
                self.cleanup_partial(&file_id).await;
                Err(AppError::Storage(format!("Failed to finalize upload: {e}")))
            }
        }
    }

    /// Store an object from an in-memory buffer.
    pub async fn upload_bytes(
        &self,
        input: UploadMediaInput,
        data: Bytes,
    ) -> AppResult<media_file::Model> {
        self.upload_stream(input, stream::iter([Ok(data)])).await
    }

    /// Open an object for streamed reading.
    ///
    /// Returns the object metadata and a stream of its content in chunk
    /// order. Fails with a not-found error if the id is absent from that
    /// bucket.
    pub async fn open_read_stream(
        &self,
        bucket: MediaBucket,
        id: &str,
    ) -> AppResult<(media_file::Model, BoxStream<'static, AppResult<Bytes>>)> {
        let file = self.repo.get_file(bucket, id).await?;

        let repo = self.repo.clone();
        let file_id = file.id.clone();
        let content = stream::try_unfold(0i32, move |seq| {
            let repo = repo.clone();
            let file_id = file_id.clone();
            async move {
                match repo.find_chunk(&file_id, seq).await? {
                    Some(chunk) => Ok(Some((Bytes::from(chunk.data), seq + 1))),
                    None => Ok(None),
                }
            }
        })
        .boxed();

        Ok((file, content))
    }

    /// Read an object fully into memory. Intended for small objects and
    /// tests; retrieval endpoints stream instead.
    pub async fn read_all(&self, bucket: MediaBucket, id: &str) -> AppResult<Vec<u8>> {
        let file = self.repo.get_file(bucket, id).await?;
        let chunks = self.repo.find_chunks(&file.id).await?;

        let mut data = Vec::with_capacity(usize::try_from(file.size_bytes).unwrap_or(0));
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }
        Ok(data)
    }

    /// Delete an object by id.
    ///
    /// Idempotent by default; with `strict` a missing id fails with a
    /// not-found error instead of being a no-op.
    pub async fn delete(&self, bucket: MediaBucket, id: &str, strict: bool) -> AppResult<()> {
        let existed = self.repo.delete_file(bucket, id).await?;
        self.repo.delete_chunks(id).await?;

        if strict && !existed {
            return Err(AppError::NotFound(format!(
                "media {id} in bucket {}",
                bucket.as_str()
            )));
        }
        Ok(())
    }

    /// List all objects in a bucket.
    pub async fn list_all(&self, bucket: MediaBucket) -> AppResult<Vec<media_file::Model>> {
        self.repo.list_bucket(bucket).await
    }

    /// Objects not referenced by any report.
    ///
    /// Discovery only: orphans are reported, never reaped automatically.
    /// The caller supplies the set of ids referenced by report records.
    pub async fn find_orphans(
        &self,
        referenced_ids: &HashSet<String>,
    ) -> AppResult<Vec<media_file::Model>> {
        let files = self.repo.list_all_files().await?;
        Ok(files
            .into_iter()
            .filter(|f| !referenced_ids.contains(&f.id))
            .collect())
    }

    async fn cleanup_partial(&self, file_id: &str) {
        if let Err(e) = self.repo.delete_chunks(file_id).await {
            tracing::warn!(file_id = %file_id, error = %e, "Failed to clean up partial upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_mime_has_no_bucket() {
        assert!(MediaBucket::for_mime("application/pdf").is_none());
        assert!(MediaBucket::for_mime("audio/mpeg").is_none());
        assert_eq!(MediaBucket::for_mime("image/webp"), Some(MediaBucket::Images));
        assert_eq!(MediaBucket::for_mime("video/webm"), Some(MediaBucket::Videos));
    }
}
