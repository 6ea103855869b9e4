use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Season::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Season::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Season::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Season::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Season::Name).string().not_null())
                    .col(ColumnDef::new(Season::Status).string().not_null())
                    .col(ColumnDef::new(Season::StartDate).date().not_null())
                    .col(ColumnDef::new(Season::EndDate).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_season_tenant")
                    .table(Season::Table)
                    .col(Season::TenantId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Season::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Season {
    Table,
    Id,
    ExternalId,
    TenantId,
    Name,
    Status,
    StartDate,
    EndDate,
}
