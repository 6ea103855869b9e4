use sea_orm_migration::prelude::*;

use crate::m20240601_000003_create_venue::Venue;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VenueAvailabilityRule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VenueAvailabilityRule::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VenueAvailabilityRule::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(VenueAvailabilityRule::TenantId).uuid().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::VenueId).integer().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::DayOfWeek).string().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::StartMinute).integer().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::EndMinute).integer().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::Kind).string().not_null())
                    .col(ColumnDef::new(VenueAvailabilityRule::Priority).integer().not_null().default(0))
                    .col(ColumnDef::new(VenueAvailabilityRule::ExpiryDate).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_availability_rule_venue")
                            .from(VenueAvailabilityRule::Table, VenueAvailabilityRule::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VenueAvailabilityRule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum VenueAvailabilityRule {
    Table,
    Id,
    ExternalId,
    TenantId,
    VenueId,
    DayOfWeek,
    StartMinute,
    EndMinute,
    Kind,
    Priority,
    ExpiryDate,
}
