use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(pk_auto(Equipment::Id))
                    .col(string_len(Equipment::Name, 120).not_null())
                    .col(integer(Equipment::TotalQuantity).not_null())
                    .col(integer(Equipment::AvailableQuantity).not_null())
                    .col(big_integer(Equipment::RentalPrice).not_null().default(0))
                    .col(string_len(Equipment::Status, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Equipment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Equipment::AvailableQuantity).gte(0))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Equipment {
    Table,
    Id,
    Name,
    TotalQuantity,
    AvailableQuantity,
    RentalPrice,
    Status,
    CreatedAt,
}
