use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{Actor, BookingRequest, BookingWithDetails};
use crate::entities::booking;
use crate::error::{AppError, AppResult};
use crate::handlers::parse_reason;
use crate::utils::jwt::Claims;
use crate::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// First occurrence of a new series, plus the ids of all of its occurrences.
#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    #[serde(flatten)]
    pub first: BookingWithDetails,
    pub occurrence_ids: Vec<i32>,
}

impl BookingCreatedResponse {
    fn from_series(series: Vec<BookingWithDetails>) -> AppResult<Self> {
        let occurrence_ids = series.iter().map(|b| b.booking.id).collect();
        let first = series
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Booking request produced no occurrences".to_string()))?;
        Ok(Self {
            first,
            occurrence_ids,
        })
    }
}

fn idempotency_key(headers: &HeaderMap) -> AppResult<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .map_err(|_| AppError::InvalidArgument("Idempotency-Key must be ASCII".to_string()))?
        .trim();
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Idempotency-Key must be 1 to {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }
    Ok(Some(key.to_string()))
}

/// Create a booking, or a recurring series of them
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(payload): Json<BookingRequest>,
) -> AppResult<Json<BookingCreatedResponse>> {
    let key = idempotency_key(&headers)?;
    let series = state
        .engine
        .create(claims.sub, payload, key.as_deref())
        .await?;

    Ok(Json(BookingCreatedResponse::from_series(series)?))
}

/// List my bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = state.engine.list_for_requester(claims.sub).await?;
    Ok(Json(bookings))
}

/// Get one booking with its equipment
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<BookingWithDetails>> {
    let booking = state
        .engine
        .find(booking_id, &Actor::from(&claims))
        .await?;
    Ok(Json(booking))
}

/// Cancel a booking
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<booking::Model>> {
    let reason = parse_reason(&body)?;
    let booking = state
        .engine
        .cancel(booking_id, &Actor::from(&claims), reason)
        .await?;
    Ok(Json(booking))
}

/// Replace a booking with a new request
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<i32>,
    Json(payload): Json<BookingRequest>,
) -> AppResult<Json<BookingCreatedResponse>> {
    let series = state
        .engine
        .reschedule(booking_id, claims.sub, payload)
        .await?;
    Ok(Json(BookingCreatedResponse::from_series(series)?))
}

/// List every occurrence of a recurring series
pub async fn get_series(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = state
        .engine
        .list_series(group_id, &Actor::from(&claims))
        .await?;
    Ok(Json(bookings))
}

/// Cancel the remaining occurrences of a recurring series
pub async fn cancel_series(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<Vec<booking::Model>>> {
    let reason = parse_reason(&body)?;
    let bookings = state
        .engine
        .cancel_series(group_id, &Actor::from(&claims), reason)
        .await?;
    Ok(Json(bookings))
}
