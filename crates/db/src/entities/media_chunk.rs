//! Media chunk entity (binary content of stored objects).

use sea_orm::entity::prelude::*;

/// One fixed-size slice of a stored object, keyed by `(file_id, seq)`.
///
/// Chunks are written before the owning [`super::media_file`] row, so the
/// presence of chunks alone does not make an object retrievable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "media_chunk")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: String,

    /// Zero-based chunk sequence number.
    #[sea_orm(primary_key, auto_increment = false)]
    pub seq: i32,

    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
