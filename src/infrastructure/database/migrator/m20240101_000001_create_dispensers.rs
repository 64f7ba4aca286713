//! Create dispensers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dispensers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dispensers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dispensers::FlowVolume).string().not_null())
                    .col(
                        ColumnDef::new(Dispensers::Status)
                            .string()
                            .not_null()
                            .default("closed"),
                    )
                    .col(
                        ColumnDef::new(Dispensers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dispensers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Dispensers {
    Table,
    Id,
    FlowVolume,
    Status,
    CreatedAt,
}
