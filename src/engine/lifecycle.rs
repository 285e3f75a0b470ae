//! Status transitions of a single booking.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──complete──▶ COMPLETED
//!    │ └──reject──▶ REJECTED        │
//!    ├──────cancel──────────────────┴──▶ CANCELLED
//!    └──────reschedule──────────────┴──▶ RESCHEDULED
//! ```
//!
//! Cancel is refused only for CANCELLED, COMPLETED and REJECTED bookings, so a
//! RESCHEDULED booking may still be cancelled. Reschedule is refused only for
//! CANCELLED, REJECTED and RESCHEDULED ones, so a COMPLETED booking may be
//! rescheduled.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::booking::{self, BookingStatus};
use crate::error::{AppError, AppResult};

/// Longest cancellation or rejection reason a booking row can hold.
pub const MAX_REASON_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Complete,
    Cancel,
    /// Superseded by a replacement booking.
    Supersede,
}

impl Transition {
    pub fn verb(self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
            Transition::Supersede => "reschedule",
        }
    }

    pub fn target(self) -> BookingStatus {
        match self {
            Transition::Approve => BookingStatus::Approved,
            Transition::Reject => BookingStatus::Rejected,
            Transition::Complete => BookingStatus::Completed,
            Transition::Cancel => BookingStatus::Cancelled,
            Transition::Supersede => BookingStatus::Rescheduled,
        }
    }

    pub fn permits(self, from: BookingStatus) -> bool {
        match self {
            Transition::Approve | Transition::Reject => from == BookingStatus::Pending,
            Transition::Complete => from == BookingStatus::Approved,
            Transition::Cancel => !matches!(
                from,
                BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::Rejected
            ),
            Transition::Supersede => !matches!(
                from,
                BookingStatus::Cancelled | BookingStatus::Rejected | BookingStatus::Rescheduled
            ),
        }
    }
}

pub fn check(current: BookingStatus, transition: Transition) -> AppResult<BookingStatus> {
    if transition.permits(current) {
        Ok(transition.target())
    } else {
        Err(AppError::InvalidTransition {
            action: transition.verb(),
            status: current,
        })
    }
}

pub fn check_reason(reason: Option<&str>) -> AppResult<()> {
    match reason {
        Some(reason) if reason.chars().count() > MAX_REASON_CHARS => {
            Err(AppError::InvalidArgument(format!(
                "Reason must be at most {} characters",
                MAX_REASON_CHARS
            )))
        }
        _ => Ok(()),
    }
}

/// Persist `transition` on `booking` and return the updated row.
///
/// The update only matches while the row still has the status that was
/// read, so of two concurrent transitions on one booking exactly one wins.
pub async fn apply<C: ConnectionTrait>(
    conn: &C,
    booking: &booking::Model,
    transition: Transition,
    reason: Option<String>,
) -> AppResult<booking::Model> {
    check_reason(reason.as_deref())?;
    let target = check(booking.status, transition)?;

    let mut update = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(target))
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(booking.status));

    match transition {
        Transition::Cancel => {
            update = update
                .col_expr(booking::Column::CancellationReason, Expr::value(reason))
                .col_expr(
                    booking::Column::CancelledAt,
                    Expr::value(Utc::now().fixed_offset()),
                );
        }
        Transition::Reject => {
            update = update.col_expr(booking::Column::RejectionReason, Expr::value(reason));
        }
        Transition::Approve | Transition::Complete | Transition::Supersede => {}
    }

    let result = update.exec(conn).await?;

    let current = booking::Entity::find_by_id(booking.id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking.id)))?;

    if result.rows_affected == 0 {
        return Err(AppError::InvalidTransition {
            action: transition.verb(),
            status: current.status,
        });
    }

    Ok(current)
}
