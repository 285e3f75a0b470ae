use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Last-resort guard against two APPROVED bookings sharing facility time.
///
/// Postgres gets a real exclusion constraint over the half-open interval.
/// Every backend gets a partial unique index on the start instant, which is
/// the strongest portable form SQLite can express.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_booking_facility_check_in_approved \
             ON booking (facility_id, check_in) WHERE status = 'APPROVED'",
        )
        .await?;

        if manager.get_database_backend() == DatabaseBackend::Postgres {
            db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS btree_gist")
                .await?;
            db.execute_unprepared(
                "ALTER TABLE booking ADD CONSTRAINT ex_booking_facility_interval \
                 EXCLUDE USING gist (facility_id WITH =, tsrange(check_in, check_out) WITH &&) \
                 WHERE (status = 'APPROVED')",
            )
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        if manager.get_database_backend() == DatabaseBackend::Postgres {
            db.execute_unprepared(
                "ALTER TABLE booking DROP CONSTRAINT IF EXISTS ex_booking_facility_interval",
            )
            .await?;
        }

        db.execute_unprepared("DROP INDEX IF EXISTS ux_booking_facility_check_in_approved")
            .await?;

        Ok(())
    }
}
