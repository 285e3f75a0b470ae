use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_equipment::Equipment;
use super::m20250301_000003_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingDetail::Table)
                    .if_not_exists()
                    .col(integer(BookingDetail::BookingId).not_null())
                    .col(integer(BookingDetail::EquipmentId).not_null())
                    .col(integer(BookingDetail::Quantity).not_null())
                    .col(string_len_null(BookingDetail::Note, 255))
                    .col(big_integer(BookingDetail::UnitPrice).not_null())
                    .primary_key(
                        Index::create()
                            .col(BookingDetail::BookingId)
                            .col(BookingDetail::EquipmentId),
                    )
                    .check(Expr::col(BookingDetail::Quantity).gte(1))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_detail_booking")
                            .from(BookingDetail::Table, BookingDetail::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_detail_equipment")
                            .from(BookingDetail::Table, BookingDetail::EquipmentId)
                            .to(Equipment::Table, Equipment::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingDetail::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingDetail {
    Table,
    BookingId,
    EquipmentId,
    Quantity,
    Note,
    UnitPrice,
}
