use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::entities::booking::{self, BookingStatus};
use crate::error::AppResult;
use crate::handlers::parse_reason;
use crate::AppState;

// ============ Booking Management ============

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub facility_id: Option<i32>,
}

/// List all bookings (admin/manager)
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = state
        .engine
        .list_all(query.status, query.facility_id)
        .await?;
    Ok(Json(bookings))
}

/// Approve a pending booking
pub async fn approve_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<booking::Model>> {
    let booking = state.engine.approve(booking_id).await?;
    Ok(Json(booking))
}

/// Reject a pending booking
pub async fn reject_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<booking::Model>> {
    let reason = parse_reason(&body)?;
    let booking = state.engine.reject(booking_id, reason).await?;
    Ok(Json(booking))
}

/// Mark an approved booking as completed
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<booking::Model>> {
    let booking = state.engine.complete(booking_id).await?;
    Ok(Json(booking))
}
