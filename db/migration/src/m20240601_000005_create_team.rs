use sea_orm_migration::prelude::*;

use crate::m20240601_000002_create_division::Division;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Team::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Team::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Team::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Team::DivisionId).integer().not_null())
                    .col(ColumnDef::new(Team::Name).string().not_null())
                    .col(ColumnDef::new(Team::PreferredVenues).json().not_null())
                    .col(ColumnDef::new(Team::BlackoutDates).json().not_null())
                    .col(ColumnDef::new(Team::MaxGamesPerWeek).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_division")
                            .from(Team::Table, Team::DivisionId)
                            .to(Division::Table, Division::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Team {
    Table,
    Id,
    ExternalId,
    TenantId,
    DivisionId,
    Name,
    PreferredVenues,
    BlackoutDates,
    MaxGamesPerWeek,
}
