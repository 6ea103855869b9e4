use sea_orm_migration::prelude::*;

use crate::m20240601_000007_create_game::Game;
use crate::m20240601_000008_create_official::Official;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignment::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Assignment::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Assignment::GameId).integer().not_null())
                    .col(ColumnDef::new(Assignment::OfficialId).integer().not_null())
                    .col(ColumnDef::new(Assignment::Role).string().not_null())
                    .col(ColumnDef::new(Assignment::Status).string().not_null())
                    .col(ColumnDef::new(Assignment::PayRate).double().not_null())
                    .col(ColumnDef::new(Assignment::EstimatedPay).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_game")
                            .from(Assignment::Table, Assignment::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_official")
                            .from(Assignment::Table, Assignment::OfficialId)
                            .to(Official::Table, Official::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assignment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Assignment {
    Table,
    Id,
    ExternalId,
    TenantId,
    GameId,
    OfficialId,
    Role,
    Status,
    PayRate,
    EstimatedPay,
}
