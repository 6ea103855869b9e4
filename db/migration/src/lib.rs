pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_season;
mod m20240601_000002_create_division;
mod m20240601_000003_create_venue;
mod m20240601_000004_create_venue_availability_rule;
mod m20240601_000005_create_team;
mod m20240601_000006_create_blackout_date;
mod m20240601_000007_create_game;
mod m20240601_000008_create_official;
mod m20240601_000009_create_assignment;
mod m20240601_000010_create_schedule_generation_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_season::Migration),
            Box::new(m20240601_000002_create_division::Migration),
            Box::new(m20240601_000003_create_venue::Migration),
            Box::new(m20240601_000004_create_venue_availability_rule::Migration),
            Box::new(m20240601_000005_create_team::Migration),
            Box::new(m20240601_000006_create_blackout_date::Migration),
            Box::new(m20240601_000007_create_game::Migration),
            Box::new(m20240601_000008_create_official::Migration),
            Box::new(m20240601_000009_create_assignment::Migration),
            Box::new(m20240601_000010_create_schedule_generation_log::Migration),
        ]
    }
}
