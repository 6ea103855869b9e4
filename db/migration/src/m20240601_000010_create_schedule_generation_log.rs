use sea_orm_migration::prelude::*;

use crate::m20240601_000001_create_season::Season;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduleGenerationLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduleGenerationLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScheduleGenerationLog::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ScheduleGenerationLog::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ScheduleGenerationLog::SeasonId).integer().not_null())
                    .col(ColumnDef::new(ScheduleGenerationLog::Status).string().not_null())
                    .col(ColumnDef::new(ScheduleGenerationLog::TotalGames).integer().not_null())
                    .col(ColumnDef::new(ScheduleGenerationLog::Scheduled).integer().not_null())
                    .col(ColumnDef::new(ScheduleGenerationLog::GenerationTimeMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(ScheduleGenerationLog::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_generation_log_season")
                            .from(ScheduleGenerationLog::Table, ScheduleGenerationLog::SeasonId)
                            .to(Season::Table, Season::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduleGenerationLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ScheduleGenerationLog {
    Table,
    Id,
    ExternalId,
    TenantId,
    SeasonId,
    Status,
    TotalGames,
    Scheduled,
    GenerationTimeMs,
    StartedAt,
}
