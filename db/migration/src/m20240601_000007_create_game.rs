use sea_orm_migration::prelude::*;

use crate::m20240601_000001_create_season::Season;
use crate::m20240601_000002_create_division::Division;
use crate::m20240601_000003_create_venue::Venue;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Game::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Game::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Game::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Game::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Game::SeasonId).integer().not_null())
                    .col(ColumnDef::new(Game::DivisionId).integer().not_null())
                    .col(ColumnDef::new(Game::HomeTeamId).integer().not_null())
                    .col(ColumnDef::new(Game::AwayTeamId).integer().not_null())
                    .col(ColumnDef::new(Game::VenueId).integer().not_null())
                    .col(ColumnDef::new(Game::GameNumber).string().not_null())
                    .col(ColumnDef::new(Game::GameType).string().not_null())
                    .col(ColumnDef::new(Game::ScheduledStart).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Game::DurationMinutes).integer().not_null())
                    .col(ColumnDef::new(Game::Status).string().not_null())
                    .col(ColumnDef::new(Game::HomeScore).integer())
                    .col(ColumnDef::new(Game::AwayScore).integer())
                    .col(ColumnDef::new(Game::CancelledReason).string())
                    .col(ColumnDef::new(Game::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_season")
                            .from(Game::Table, Game::SeasonId)
                            .to(Season::Table, Season::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_division")
                            .from(Game::Table, Game::DivisionId)
                            .to(Division::Table, Division::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_venue")
                            .from(Game::Table, Game::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_tenant_season")
                    .table(Game::Table)
                    .col(Game::TenantId)
                    .col(Game::SeasonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_tenant_venue_start")
                    .table(Game::Table)
                    .col(Game::TenantId)
                    .col(Game::VenueId)
                    .col(Game::ScheduledStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_tenant_home_start")
                    .table(Game::Table)
                    .col(Game::TenantId)
                    .col(Game::HomeTeamId)
                    .col(Game::ScheduledStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_tenant_away_start")
                    .table(Game::Table)
                    .col(Game::TenantId)
                    .col(Game::AwayTeamId)
                    .col(Game::ScheduledStart)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Game::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Game {
    Table,
    Id,
    ExternalId,
    TenantId,
    SeasonId,
    DivisionId,
    HomeTeamId,
    AwayTeamId,
    VenueId,
    GameNumber,
    GameType,
    ScheduledStart,
    DurationMinutes,
    Status,
    HomeScore,
    AwayScore,
    CancelledReason,
    Notes,
}
