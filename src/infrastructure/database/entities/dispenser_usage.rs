//! Dispenser usage session entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dispenser_usages")]
pub struct Model {
    /// Insertion sequence; ordering by id gives creation order
    #[sea_orm(primary_key)]
    pub id: i32,

    pub dispenser_id: String,

    pub opened_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub closed_at: Option<DateTimeUtc>,

    /// Flow volume snapshot taken when the session was opened
    pub flow_volume: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dispenser::Entity",
        from = "Column::DispenserId",
        to = "super::dispenser::Column::Id",
        on_delete = "Cascade"
    )]
    Dispenser,
}

impl Related<super::dispenser::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispenser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
