use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Facility::Table)
                    .if_not_exists()
                    .col(pk_auto(Facility::Id))
                    .col(string_len(Facility::Name, 120).not_null())
                    .col(string_len(Facility::FacilityType, 50).not_null())
                    .col(integer(Facility::Capacity).not_null())
                    .col(big_integer(Facility::Price).not_null().default(0))
                    .col(string_len(Facility::PriceType, 16).not_null())
                    .col(boolean(Facility::RequiresApproval).not_null().default(true))
                    .col(string_len(Facility::Status, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Facility::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Facility::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Facility {
    Table,
    Id,
    Name,
    FacilityType,
    Capacity,
    Price,
    PriceType,
    RequiresApproval,
    Status,
    CreatedAt,
}
