use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_facilities::Facility;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(pk_auto(Booking::Id))
                    .col(uuid(Booking::RequesterId).not_null())
                    .col(integer(Booking::FacilityId).not_null())
                    .col(string_len(Booking::Purpose, 255).not_null())
                    .col(string_len(Booking::Category, 16).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(date_time(Booking::CheckIn).not_null())
                    .col(date_time(Booking::CheckOut).not_null())
                    .col(big_integer(Booking::TotalAmount).not_null().default(0))
                    .col(string_len_null(Booking::CancellationReason, 255))
                    .col(timestamp_with_time_zone_null(Booking::CancelledAt))
                    .col(string_len_null(Booking::RejectionReason, 255))
                    .col(uuid_null(Booking::RecurrenceGroupId))
                    .col(integer_null(Booking::ParentBookingId))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Booking::CheckIn).lt(Expr::col(Booking::CheckOut)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_facility")
                            .from(Booking::Table, Booking::FacilityId)
                            .to(Facility::Table, Facility::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_parent")
                            .from(Booking::Table, Booking::ParentBookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_facility_check_in")
                    .table(Booking::Table)
                    .col(Booking::FacilityId)
                    .col(Booking::CheckIn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_requester")
                    .table(Booking::Table)
                    .col(Booking::RequesterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_recurrence_group")
                    .table(Booking::Table)
                    .col(Booking::RecurrenceGroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    RequesterId,
    FacilityId,
    Purpose,
    Category,
    Status,
    CheckIn,
    CheckOut,
    TotalAmount,
    CancellationReason,
    CancelledAt,
    RejectionReason,
    RecurrenceGroupId,
    ParentBookingId,
    CreatedAt,
}
