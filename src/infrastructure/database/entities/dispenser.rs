//! Dispenser entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dispensers")]
pub struct Model {
    /// UUID in hyphenated form
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Liters per second as a canonical decimal string (scale 4)
    pub flow_volume: String,

    /// Status: open, closed
    pub status: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dispenser_usage::Entity")]
    Usages,
}

impl Related<super::dispenser_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
