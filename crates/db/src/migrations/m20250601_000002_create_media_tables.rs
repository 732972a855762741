//! Create media file and media chunk tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MediaFile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MediaFile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MediaFile::Bucket).string_len(16).not_null())
                    .col(
                        ColumnDef::new(MediaFile::Filename)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaFile::MimeType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MediaFile::SizeBytes).big_integer().not_null())
                    .col(ColumnDef::new(MediaFile::Metadata).json_binary())
                    .col(
                        ColumnDef::new(MediaFile::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: bucket (for per-bucket listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_media_file_bucket")
                    .table(MediaFile::Table)
                    .col(MediaFile::Bucket)
                    .to_owned(),
            )
            .await?;

        // Chunk table; no foreign key to media_file because chunks are
        // written before the metadata row exists.
        manager
            .create_table(
                Table::create()
                    .table(MediaChunk::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MediaChunk::FileId).string_len(32).not_null())
                    .col(ColumnDef::new(MediaChunk::Seq).integer().not_null())
                    .col(ColumnDef::new(MediaChunk::Data).binary().not_null())
                    .primary_key(
                        Index::create()
                            .col(MediaChunk::FileId)
                            .col(MediaChunk::Seq),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_chunk_file_id")
                    .table(MediaChunk::Table)
                    .col(MediaChunk::FileId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MediaChunk::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MediaFile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MediaFile {
    Table,
    Id,
    Bucket,
    Filename,
    MimeType,
    SizeBytes,
    Metadata,
    UploadedAt,
}

#[derive(Iden)]
enum MediaChunk {
    Table,
    FileId,
    Seq,
    Data,
}
