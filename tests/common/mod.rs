#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use facility_booking::engine::{BookingEngine, BookingRequest, IdempotencyStore};
use facility_booking::entities::booking::BookingCategory;
use facility_booking::entities::equipment::{self, EquipmentStatus};
use facility_booking::entities::facility::{self, FacilityStatus, PriceType};
use facility_booking::notify::{BookingEvent, BookingNotifier};
use facility_booking::utils::jwt::{create_token, Role};
use facility_booking::Config;

pub const JWT_SECRET: &str = "test-secret";

/// Fresh in-memory database with the production schema.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opts).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn seed_facility(db: &DatabaseConnection, name: &str) -> facility::Model {
    seed_priced_facility(db, name, 1000, PriceType::Hourly).await
}

pub async fn seed_priced_facility(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    price_type: PriceType,
) -> facility::Model {
    facility::ActiveModel {
        name: Set(name.to_string()),
        facility_type: Set("hall".to_string()),
        capacity: Set(80),
        price: Set(price),
        price_type: Set(price_type),
        requires_approval: Set(true),
        status: Set(FacilityStatus::Available),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_equipment(
    db: &DatabaseConnection,
    name: &str,
    available_quantity: i32,
    rental_price: i64,
) -> equipment::Model {
    equipment::ActiveModel {
        name: Set(name.to_string()),
        total_quantity: Set(available_quantity),
        available_quantity: Set(available_quantity),
        rental_price: Set(rental_price),
        status: Set(EquipmentStatus::Available),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Notifier that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<BookingEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<BookingEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn notify(&self, event: &BookingEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn engine(db: &DatabaseConnection) -> (BookingEngine, Arc<RecordingNotifier>) {
    engine_with_cap(db, 366)
}

pub fn engine_with_cap(
    db: &DatabaseConnection,
    max_occurrences: usize,
) -> (BookingEngine, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = BookingEngine::new(
        db.clone(),
        notifier.clone(),
        Arc::new(IdempotencyStore::new(Duration::from_secs(60))),
        max_occurrences,
    );
    (engine, notifier)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn request(facility_id: i32, on: NaiveDate, start_slot: u32, end_slot: u32) -> BookingRequest {
    BookingRequest {
        facility_id,
        purpose: "Department meeting".to_string(),
        category: BookingCategory::Academic,
        date: on,
        start_slot,
        end_slot,
        equipment: Vec::new(),
        recurrence: None,
        recurrence_end_date: None,
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        max_recurrence_occurrences: 366,
        idempotency_ttl_secs: 60,
    }
}

pub fn token(subject: Uuid, role: Role) -> String {
    create_token(subject, role, JWT_SECRET, 1).unwrap()
}
