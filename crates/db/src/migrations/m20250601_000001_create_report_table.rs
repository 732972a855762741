//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Report::ShortId)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Report::EncryptedMessage).text().not_null())
                    .col(
                        ColumnDef::new(Report::EncryptionIv)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Report::EncryptionAuthTag)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Report::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Severity).string_len(16).not_null())
                    .col(ColumnDef::new(Report::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Report::PhotoFileId).string_len(32))
                    .col(ColumnDef::new(Report::VideoFileId).string_len(32))
                    .col(ColumnDef::new(Report::AdditionalMediaIds).json_binary())
                    .col(ColumnDef::new(Report::Latitude).double())
                    .col(ColumnDef::new(Report::Longitude).double())
                    .col(ColumnDef::new(Report::Accuracy).double())
                    .col(ColumnDef::new(Report::Address).text())
                    .col(ColumnDef::new(Report::AdminNotes).text())
                    .col(ColumnDef::new(Report::AdminResponse).text())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::EscalatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: short_id (for status lookups by share code)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_short_id")
                    .table(Report::Table)
                    .col(Report::ShortId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (severity, status, created_at) (for escalation scans)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_severity_status_created_at")
                    .table(Report::Table)
                    .col(Report::Severity)
                    .col(Report::Status)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for listing/pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_created_at")
                    .table(Report::Table)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ShortId,
    EncryptedMessage,
    EncryptionIv,
    EncryptionAuthTag,
    Category,
    Severity,
    Status,
    PhotoFileId,
    VideoFileId,
    AdditionalMediaIds,
    Latitude,
    Longitude,
    Accuracy,
    Address,
    AdminNotes,
    AdminResponse,
    CreatedAt,
    ResolvedAt,
    EscalatedAt,
}
