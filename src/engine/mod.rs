pub mod availability;
pub mod idempotency;
pub mod inventory;
pub mod lifecycle;
mod orchestrator;

pub use idempotency::IdempotencyStore;
pub use orchestrator::{
    Actor, BookingEngine, BookingRequest, BookingWithDetails, CalendarEntry, MAX_PURPOSE_CHARS,
    MAX_PURPOSE_WORDS,
};
