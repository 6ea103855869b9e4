//! `SeaORM` Entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "venue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// One of `VenueType`'s `SCREAMING_SNAKE_CASE` variants.
    pub venue_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub city: String,
    pub state: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::venue_availability_rule::Entity")]
    VenueAvailabilityRule,
    #[sea_orm(has_many = "super::game::Entity")]
    Game,
}

impl Related<super::venue_availability_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VenueAvailabilityRule.def()
    }
}

impl Related<super::game::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
