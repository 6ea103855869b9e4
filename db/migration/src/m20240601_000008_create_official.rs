use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Official::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Official::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Official::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Official::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Official::Name).string().not_null())
                    .col(ColumnDef::new(Official::Certification).string().not_null())
                    .col(ColumnDef::new(Official::Specialties).json().not_null())
                    .col(ColumnDef::new(Official::MaxGamesPerDay).integer().not_null())
                    .col(ColumnDef::new(Official::MaxGamesPerWeek).integer().not_null())
                    .col(ColumnDef::new(Official::TravelRadiusKm).double().not_null())
                    .col(ColumnDef::new(Official::HourlyRate).double().not_null())
                    .col(ColumnDef::new(Official::HomeLatitude).double())
                    .col(ColumnDef::new(Official::HomeLongitude).double())
                    .col(ColumnDef::new(Official::Active).boolean().not_null().default(true))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Official::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Official {
    Table,
    Id,
    ExternalId,
    TenantId,
    Name,
    Certification,
    Specialties,
    MaxGamesPerDay,
    MaxGamesPerWeek,
    TravelRadiusKm,
    HourlyRate,
    HomeLatitude,
    HomeLongitude,
    Active,
}
