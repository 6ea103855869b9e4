//! `SeaORM` Entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub tenant_id: Uuid,
    pub game_id: i32,
    pub official_id: i32,
    /// One of `OfficialSpecialty`'s `SCREAMING_SNAKE_CASE` variants.
    pub role: String,
    /// One of `AssignmentStatus`'s `SCREAMING_SNAKE_CASE` variants.
    pub status: String,
    pub pay_rate: f64,
    pub estimated_pay: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::game::Entity",
        from = "Column::GameId",
        to = "super::game::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Game,
    #[sea_orm(
        belongs_to = "super::official::Entity",
        from = "Column::OfficialId",
        to = "super::official::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Official,
}

impl Related<super::game::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl Related<super::official::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Official.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
