//! Media file entity (chunked object store metadata).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Typed buckets of the media store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MediaBucket {
    #[sea_orm(string_value = "images")]
    Images,
    #[sea_orm(string_value = "videos")]
    Videos,
}

impl MediaBucket {
    /// Select the bucket for a MIME type by its prefix.
    ///
    /// Returns `None` for unrecognized types; callers reject those uploads
    /// before any bytes are written.
    #[must_use]
    pub fn for_mime(mime_type: &str) -> Option<Self> {
        if mime_type.starts_with("image/") {
            Some(Self::Images)
        } else if mime_type.starts_with("video/") {
            Some(Self::Videos)
        } else {
            None
        }
    }

    /// Canonical string value, matching the persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }
}

/// Metadata row for one stored object. Binary content lives in
/// [`super::media_chunk`]; this row is inserted last, so an object is only
/// retrievable once all of its chunks are durable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub bucket: MediaBucket,

    /// Original file name as uploaded.
    pub filename: String,

    /// MIME type served back on retrieval.
    pub mime_type: String,

    pub size_bytes: i64,

    /// Free-form metadata; carries the originating report linkage hint.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_for_mime() {
        assert_eq!(MediaBucket::for_mime("image/jpeg"), Some(MediaBucket::Images));
        assert_eq!(MediaBucket::for_mime("image/png"), Some(MediaBucket::Images));
        assert_eq!(MediaBucket::for_mime("video/mp4"), Some(MediaBucket::Videos));
        assert_eq!(MediaBucket::for_mime("application/pdf"), None);
        assert_eq!(MediaBucket::for_mime("text/plain"), None);
    }
}
