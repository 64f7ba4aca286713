//! Create dispenser_usages table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_dispensers::Dispensers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DispenserUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DispenserUsages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DispenserUsages::DispenserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DispenserUsages::OpenedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DispenserUsages::ClosedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(DispenserUsages::FlowVolume)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dispenser_usages_dispenser")
                            .from(DispenserUsages::Table, DispenserUsages::DispenserId)
                            .to(Dispensers::Table, Dispensers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Usage history is always read per dispenser
        manager
            .create_index(
                Index::create()
                    .name("idx_dispenser_usages_dispenser")
                    .table(DispenserUsages::Table)
                    .col(DispenserUsages::DispenserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DispenserUsages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum DispenserUsages {
    Table,
    Id,
    DispenserId,
    OpenedAt,
    ClosedAt,
    FlowVolume,
}
