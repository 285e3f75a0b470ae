use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::CalendarEntry;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Occupied and pending intervals of a facility, without requester details
pub async fn facility_calendar(
    State(state): State<AppState>,
    Path(facility_id): Path<i32>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEntry>>> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::InvalidArgument(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }

    let entries = state
        .engine
        .list_for_facility(facility_id, query.from, query.to)
        .await?;
    Ok(Json(entries))
}
