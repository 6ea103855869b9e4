//! `SeaORM` Entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "official")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// One of `OfficialCertification`'s `SCREAMING_SNAKE_CASE` variants.
    pub certification: String,
    /// JSON array of `OfficialSpecialty` variants.
    pub specialties: Json,
    pub max_games_per_day: i32,
    pub max_games_per_week: i32,
    pub travel_radius_km: f64,
    pub hourly_rate: f64,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignment,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
