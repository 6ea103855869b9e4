use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Venue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Venue::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Venue::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Venue::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Venue::Name).string().not_null())
                    .col(ColumnDef::new(Venue::VenueType).string().not_null())
                    .col(ColumnDef::new(Venue::Latitude).double())
                    .col(ColumnDef::new(Venue::Longitude).double())
                    .col(ColumnDef::new(Venue::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Venue::City).string().not_null())
                    .col(ColumnDef::new(Venue::State).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Venue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Venue {
    Table,
    Id,
    ExternalId,
    TenantId,
    Name,
    VenueType,
    Latitude,
    Longitude,
    Active,
    City,
    State,
}
