pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_facilities;
mod m20250301_000002_create_equipment;
mod m20250301_000003_create_bookings;
mod m20250301_000004_create_booking_details;
mod m20250301_000005_add_booking_interval_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_facilities::Migration),
            Box::new(m20250301_000002_create_equipment::Migration),
            Box::new(m20250301_000003_create_bookings::Migration),
            Box::new(m20250301_000004_create_booking_details::Migration),
            Box::new(m20250301_000005_add_booking_interval_guard::Migration),
        ]
    }
}
