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
                    .table(Division::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Division::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Division::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Division::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Division::SeasonId).integer().not_null())
                    .col(ColumnDef::new(Division::Name).string().not_null())
                    .col(ColumnDef::new(Division::SkillLevel).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_division_season")
                            .from(Division::Table, Division::SeasonId)
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
            .drop_table(Table::drop().table(Division::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Division {
    Table,
    Id,
    ExternalId,
    TenantId,
    SeasonId,
    Name,
    SkillLevel,
}
