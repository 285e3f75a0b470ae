use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, RuntimeErr,
    SqlErr,
};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::facility;
use crate::error::{AppError, AppResult};

/// Statuses whose interval occupies a facility.
pub const BLOCKING_STATUSES: &[BookingStatus] = &[BookingStatus::Approved];

/// Statuses shown on a facility's public calendar.
pub const CALENDAR_STATUSES: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::Approved];

/// SQLSTATEs that mean a concurrent writer got to the facility first:
/// unique violation, exclusion violation, serialization failure, deadlock.
const RACE_SQLSTATES: &[&str] = &["23505", "23P01", "40001", "40P01"];

/// Half-open interval overlap. Intervals that merely touch do not overlap.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether a booking of `facility_id` in one of `blocking` overlaps `[check_in, check_out)`.
///
/// Must run on the transaction that will perform the insert.
pub async fn has_conflict<C: ConnectionTrait>(
    conn: &C,
    facility_id: i32,
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    blocking: &[BookingStatus],
    exclude: Option<i32>,
) -> AppResult<bool> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::FacilityId.eq(facility_id))
        .filter(booking::Column::Status.is_in(blocking.iter().copied()))
        .filter(booking::Column::CheckIn.lt(check_out))
        .filter(booking::Column::CheckOut.gt(check_in));

    if let Some(id) = exclude {
        query = query.filter(booking::Column::Id.ne(id));
    }

    Ok(query.count(conn).await? > 0)
}

pub async fn ensure_available<C: ConnectionTrait>(
    conn: &C,
    facility: &facility::Model,
    date: NaiveDate,
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    exclude: Option<i32>,
) -> AppResult<()> {
    if has_conflict(conn, facility.id, check_in, check_out, BLOCKING_STATUSES, exclude).await? {
        tracing::debug!(
            facility_id = facility.id,
            %check_in,
            %check_out,
            "Rejected overlapping booking"
        );
        return Err(AppError::Conflict {
            facility: facility.name.clone(),
            date,
        });
    }
    Ok(())
}

/// Whether a storage error is the losing side of a booking race.
pub fn is_write_race(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| RACE_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Turn a lost race into the same `Conflict` the availability check raises.
pub fn translate_write_error(err: DbErr, facility: &str, date: NaiveDate) -> AppError {
    if is_write_race(&err) {
        tracing::warn!(facility, %date, error = %err, "Booking race resolved at the storage layer");
        return AppError::Conflict {
            facility: facility.to_string(),
            date,
        };
    }
    AppError::Database(err)
}
