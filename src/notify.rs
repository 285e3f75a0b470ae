use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;

/// Something that happened to bookings and has already been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Created {
        booking_ids: Vec<i32>,
        facility_id: i32,
        requester_id: Uuid,
        recurrence_group_id: Option<Uuid>,
    },
    Rescheduled {
        previous_id: i32,
        booking_ids: Vec<i32>,
    },
    StatusChanged {
        booking_id: i32,
        from: BookingStatus,
        to: BookingStatus,
    },
}

/// Outbound channel for booking events (mail, chat, payment hooks...).
///
/// Called only after the owning transaction has committed. Implementations
/// handle their own delivery failures; a booking never fails because a
/// notification could not be sent.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify(&self, event: &BookingEvent);
}

/// Default notifier: records events in the service log.
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn notify(&self, event: &BookingEvent) {
        match event {
            BookingEvent::Created {
                booking_ids,
                facility_id,
                requester_id,
                recurrence_group_id,
            } => tracing::info!(
                ?booking_ids,
                facility_id,
                %requester_id,
                ?recurrence_group_id,
                "Bookings created"
            ),
            BookingEvent::Rescheduled {
                previous_id,
                booking_ids,
            } => tracing::info!(previous_id, ?booking_ids, "Booking rescheduled"),
            BookingEvent::StatusChanged {
                booking_id,
                from,
                to,
            } => tracing::info!(booking_id, %from, %to, "Booking status changed"),
        }
    }
}
