//! `SeaORM` Entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "game")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub tenant_id: Uuid,
    pub season_id: i32,
    pub division_id: i32,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub venue_id: i32,
    pub game_number: String,
    /// One of `GameType`'s `SCREAMING_SNAKE_CASE` variants.
    pub game_type: String,
    pub scheduled_start: DateTimeUtc,
    pub duration_minutes: i32,
    /// One of `GameStatus`'s `SCREAMING_SNAKE_CASE` variants.
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub cancelled_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::season::Entity",
        from = "Column::SeasonId",
        to = "super::season::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Season,
    #[sea_orm(
        belongs_to = "super::division::Entity",
        from = "Column::DivisionId",
        to = "super::division::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Division,
    #[sea_orm(
        belongs_to = "super::venue::Entity",
        from = "Column::VenueId",
        to = "super::venue::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Venue,
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignment,
}

impl Related<super::season::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Season.def()
    }
}

impl Related<super::venue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venue.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
