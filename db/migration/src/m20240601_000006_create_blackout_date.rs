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
                    .table(BlackoutDate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlackoutDate::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlackoutDate::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(BlackoutDate::TenantId).uuid().not_null())
                    .col(ColumnDef::new(BlackoutDate::SeasonId).integer().not_null())
                    .col(ColumnDef::new(BlackoutDate::StartDate).date().not_null())
                    .col(ColumnDef::new(BlackoutDate::EndDate).date().not_null())
                    .col(ColumnDef::new(BlackoutDate::AffectsVenues).json().not_null())
                    .col(ColumnDef::new(BlackoutDate::AffectsDivisions).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blackout_season")
                            .from(BlackoutDate::Table, BlackoutDate::SeasonId)
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
            .drop_table(Table::drop().table(BlackoutDate::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum BlackoutDate {
    Table,
    Id,
    ExternalId,
    TenantId,
    SeasonId,
    StartDate,
    EndDate,
    AffectsVenues,
    AffectsDivisions,
}
