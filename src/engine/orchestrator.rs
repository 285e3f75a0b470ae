use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::availability::{self, CALENDAR_STATUSES};
use super::idempotency::{Claim, ClaimGuard, IdempotencyStore};
use super::inventory::{self, EquipmentLine, ReservedLine};
use super::lifecycle::{self, Transition};
use crate::db;
use crate::entities::booking::{self, BookingCategory, BookingStatus};
use crate::entities::booking_detail;
use crate::entities::facility::{self, FacilityStatus, PriceType};
use crate::error::{AppError, AppResult};
use crate::notify::{BookingEvent, BookingNotifier};
use crate::utils::jwt::{Claims, Role};
use crate::utils::recurrence::{self, RecurrenceRule};
use crate::utils::slot::{self, MAX_SLOTS_PER_DAY};

pub const MAX_PURPOSE_CHARS: usize = 255;
pub const MAX_PURPOSE_WORDS: usize = 50;

/// A reservation request, possibly recurring, possibly with equipment.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub facility_id: i32,
    pub purpose: String,
    pub category: BookingCategory,
    pub date: NaiveDate,
    pub start_slot: u32,
    pub end_slot: u32,
    #[serde(default)]
    pub equipment: Vec<EquipmentLine>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl BookingRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.start_slot < 1 || self.end_slot > MAX_SLOTS_PER_DAY {
            return Err(AppError::InvalidArgument(format!(
                "Slots must be between 1 and {}",
                MAX_SLOTS_PER_DAY
            )));
        }
        if self.start_slot > self.end_slot {
            return Err(AppError::InvalidArgument(
                "Start slot must not be after end slot".to_string(),
            ));
        }

        let purpose = self.purpose.trim();
        if purpose.is_empty() {
            return Err(AppError::InvalidArgument("Purpose is required".to_string()));
        }
        if purpose.chars().count() > MAX_PURPOSE_CHARS {
            return Err(AppError::InvalidArgument(format!(
                "Purpose must be at most {} characters",
                MAX_PURPOSE_CHARS
            )));
        }
        if purpose.split_whitespace().count() > MAX_PURPOSE_WORDS {
            return Err(AppError::InvalidArgument(format!(
                "Purpose must be at most {} words",
                MAX_PURPOSE_WORDS
            )));
        }

        if self.recurrence.is_some() {
            match self.recurrence_end_date {
                None => {
                    return Err(AppError::InvalidArgument(
                        "Recurring bookings need an end date".to_string(),
                    ));
                }
                Some(end) if end < self.date => {
                    return Err(AppError::InvalidArgument(
                        "Recurrence end date must not be before the booking date".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }

        inventory::check_lines(&self.equipment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingWithDetails {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub details: Vec<booking_detail::Model>,
}

/// Calendar projection of a booking, independent of who made it.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct CalendarEntry {
    pub id: i32,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub status: BookingStatus,
}

/// Who is acting on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

impl Actor {
    fn authorize(&self, booking: &booking::Model) -> AppResult<()> {
        if self.role.manages_bookings() || booking.requester_id == self.id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only manage your own bookings".to_string(),
            ))
        }
    }
}

/// Dates a request expands to, and the group id that ties them together.
struct Plan {
    dates: Vec<NaiveDate>,
    recurrence_group_id: Option<Uuid>,
}

/// Rows written for one request, still inside its transaction.
struct Series {
    facility: facility::Model,
    first_date: NaiveDate,
    bookings: Vec<BookingWithDetails>,
}

/// Turns reservation requests into committed booking rows.
///
/// Every state change runs in one serializable transaction that is either
/// committed whole or rolled back whole. Notifications go out after commit.
pub struct BookingEngine {
    db: DatabaseConnection,
    notifier: Arc<dyn BookingNotifier>,
    idempotency: Arc<IdempotencyStore>,
    max_occurrences: usize,
}

impl BookingEngine {
    pub fn new(
        db: DatabaseConnection,
        notifier: Arc<dyn BookingNotifier>,
        idempotency: Arc<IdempotencyStore>,
        max_occurrences: usize,
    ) -> Self {
        Self {
            db,
            notifier,
            idempotency,
            max_occurrences,
        }
    }

    // ============ Creation ============

    /// Create every occurrence of `request`, or none of them.
    ///
    /// With an idempotency key, a repeat of a finished request returns the
    /// bookings it created instead of booking again.
    pub async fn create(
        &self,
        requester: Uuid,
        request: BookingRequest,
        idempotency_key: Option<&str>,
    ) -> AppResult<Vec<BookingWithDetails>> {
        let Some(key) = idempotency_key else {
            return self.create_series(requester, &request, None).await;
        };

        if let Claim::Replay(ids) = self.idempotency.claim(requester, key)? {
            tracing::info!(%requester, key, ?ids, "Replaying idempotent booking request");
            return self.load_with_details(&ids).await;
        }

        let guard = ClaimGuard::new(&self.idempotency, requester, key);
        self.create_series(requester, &request, Some(guard)).await
    }

    async fn create_series(
        &self,
        requester: Uuid,
        request: &BookingRequest,
        claim: Option<ClaimGuard<'_>>,
    ) -> AppResult<Vec<BookingWithDetails>> {
        let plan = self.plan(request)?;

        let txn = db::begin_serializable(&self.db).await?;
        let outcome = persist_series(&txn, requester, request, &plan, None).await;
        let series = commit_series(txn, outcome).await?;

        let booking_ids: Vec<i32> = series.bookings.iter().map(|b| b.booking.id).collect();
        // Committed: from here on a retry must replay, even if this future is dropped.
        if let Some(claim) = claim {
            claim.complete(booking_ids.clone());
        }
        tracing::info!(
            %requester,
            facility_id = series.facility.id,
            occurrences = booking_ids.len(),
            recurrence_group_id = ?plan.recurrence_group_id,
            "Booking request committed"
        );

        self.notifier
            .notify(&BookingEvent::Created {
                booking_ids,
                facility_id: series.facility.id,
                requester_id: requester,
                recurrence_group_id: plan.recurrence_group_id,
            })
            .await;

        Ok(series.bookings)
    }

    /// Supersede `old_id` with the bookings described by `request`.
    ///
    /// The old booking only becomes RESCHEDULED if every replacement
    /// occurrence is written; otherwise it is left exactly as it was.
    pub async fn reschedule(
        &self,
        old_id: i32,
        requester: Uuid,
        request: BookingRequest,
    ) -> AppResult<Vec<BookingWithDetails>> {
        let plan = self.plan(&request)?;

        let txn = db::begin_serializable(&self.db).await?;
        let outcome = supersede_and_persist(&txn, old_id, requester, &request, &plan).await;
        let (previous, series) = match outcome {
            Ok((previous, series)) => (previous, series),
            Err(err) => {
                rollback(txn).await;
                return Err(err);
            }
        };
        let series = commit_series(txn, Ok(series)).await?;

        let booking_ids: Vec<i32> = series.bookings.iter().map(|b| b.booking.id).collect();
        tracing::info!(
            %requester,
            previous_id = old_id,
            ?booking_ids,
            "Booking rescheduled"
        );

        self.notifier
            .notify(&BookingEvent::StatusChanged {
                booking_id: old_id,
                from: previous,
                to: BookingStatus::Rescheduled,
            })
            .await;
        self.notifier
            .notify(&BookingEvent::Rescheduled {
                previous_id: old_id,
                booking_ids,
            })
            .await;

        Ok(series.bookings)
    }

    fn plan(&self, request: &BookingRequest) -> AppResult<Plan> {
        request.validate()?;

        let dates = recurrence::expand(
            request.date,
            request.recurrence,
            request.recurrence_end_date,
            self.max_occurrences,
        )?;
        let recurrence_group_id = (dates.len() > 1).then(Uuid::new_v4);

        Ok(Plan {
            dates,
            recurrence_group_id,
        })
    }

    // ============ Transitions ============

    pub async fn cancel(
        &self,
        booking_id: i32,
        actor: &Actor,
        reason: Option<String>,
    ) -> AppResult<booking::Model> {
        self.transition(booking_id, Transition::Cancel, Some(actor), reason)
            .await
    }

    pub async fn reject(&self, booking_id: i32, reason: Option<String>) -> AppResult<booking::Model> {
        self.transition(booking_id, Transition::Reject, None, reason)
            .await
    }

    pub async fn complete(&self, booking_id: i32) -> AppResult<booking::Model> {
        self.transition(booking_id, Transition::Complete, None, None)
            .await
    }

    /// Approve a pending booking, provided no approved booking overlaps it.
    pub async fn approve(&self, booking_id: i32) -> AppResult<booking::Model> {
        let txn = db::begin_serializable(&self.db).await?;
        let (facility, updated) = match approve_in(&txn, booking_id).await {
            Ok(approved) => approved,
            Err(err) => {
                rollback(txn).await;
                return Err(err);
            }
        };
        txn.commit().await.map_err(|e| {
            availability::translate_write_error(e, &facility.name, updated.check_in.date())
        })?;

        tracing::info!(booking_id, facility_id = facility.id, "Booking approved");
        self.notifier
            .notify(&BookingEvent::StatusChanged {
                booking_id,
                from: BookingStatus::Pending,
                to: BookingStatus::Approved,
            })
            .await;

        Ok(updated)
    }

    async fn transition(
        &self,
        booking_id: i32,
        transition: Transition,
        actor: Option<&Actor>,
        reason: Option<String>,
    ) -> AppResult<booking::Model> {
        let txn = db::begin_serializable(&self.db).await?;
        let outcome = async {
            let current = find_booking(&txn, booking_id).await?;
            if let Some(actor) = actor {
                actor.authorize(&current)?;
            }
            let updated = lifecycle::apply(&txn, &current, transition, reason).await?;
            Ok::<_, AppError>((current.status, updated))
        }
        .await;

        let (previous, updated) = match outcome {
            Ok(changed) => changed,
            Err(err) => {
                rollback(txn).await;
                return Err(err);
            }
        };
        txn.commit().await?;

        tracing::info!(
            booking_id,
            from = %previous,
            to = %updated.status,
            "Booking status changed"
        );
        self.notifier
            .notify(&BookingEvent::StatusChanged {
                booking_id,
                from: previous,
                to: updated.status,
            })
            .await;

        Ok(updated)
    }

    /// Cancel every occurrence of a recurring series that can still be cancelled.
    pub async fn cancel_series(
        &self,
        group_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> AppResult<Vec<booking::Model>> {
        let txn = db::begin_serializable(&self.db).await?;
        let outcome = cancel_series_in(&txn, group_id, actor, reason).await;
        let changed = match outcome {
            Ok(changed) => changed,
            Err(err) => {
                rollback(txn).await;
                return Err(err);
            }
        };
        txn.commit().await?;

        tracing::info!(%group_id, cancelled = changed.len(), "Recurring series cancelled");
        for (previous, booking) in &changed {
            self.notifier
                .notify(&BookingEvent::StatusChanged {
                    booking_id: booking.id,
                    from: *previous,
                    to: booking.status,
                })
                .await;
        }

        Ok(changed.into_iter().map(|(_, booking)| booking).collect())
    }

    // ============ Queries ============

    pub async fn find(&self, booking_id: i32, actor: &Actor) -> AppResult<BookingWithDetails> {
        let booking = find_booking(&self.db, booking_id).await?;
        actor.authorize(&booking)?;

        let details = booking_detail::Entity::find()
            .filter(booking_detail::Column::BookingId.eq(booking.id))
            .order_by_asc(booking_detail::Column::EquipmentId)
            .all(&self.db)
            .await?;

        Ok(BookingWithDetails { booking, details })
    }

    /// The requester's bookings, hiding occurrences that were superseded.
    pub async fn list_for_requester(&self, requester: Uuid) -> AppResult<Vec<booking::Model>> {
        let bookings = booking::Entity::find()
            .filter(booking::Column::RequesterId.eq(requester))
            .filter(booking::Column::Status.ne(BookingStatus::Rescheduled))
            .order_by_asc(booking::Column::CheckIn)
            .all(&self.db)
            .await?;
        Ok(bookings)
    }

    /// Every occurrence of a recurring series, superseded ones included.
    pub async fn list_series(&self, group_id: Uuid, actor: &Actor) -> AppResult<Vec<booking::Model>> {
        let bookings = booking::Entity::find()
            .filter(booking::Column::RecurrenceGroupId.eq(group_id))
            .order_by_asc(booking::Column::CheckIn)
            .all(&self.db)
            .await?;

        if bookings.is_empty() {
            return Err(AppError::NotFound(format!("Series {} not found", group_id)));
        }
        for booking in &bookings {
            actor.authorize(booking)?;
        }
        Ok(bookings)
    }

    /// Occupied and tentatively held intervals of a facility.
    pub async fn list_for_facility(
        &self,
        facility_id: i32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<CalendarEntry>> {
        facility::Entity::find_by_id(facility_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", facility_id)))?;

        let mut query = booking::Entity::find()
            .select_only()
            .column(booking::Column::Id)
            .column(booking::Column::CheckIn)
            .column(booking::Column::CheckOut)
            .column(booking::Column::Status)
            .filter(booking::Column::FacilityId.eq(facility_id))
            .filter(booking::Column::Status.is_in(CALENDAR_STATUSES.iter().copied()));

        if let Some(from) = from {
            query = query.filter(booking::Column::CheckOut.gt(start_of(from)));
        }
        if let Some(to) = to {
            let end = to.checked_add_days(Days::new(1)).unwrap_or(to);
            query = query.filter(booking::Column::CheckIn.lt(start_of(end)));
        }

        let entries = query
            .order_by_asc(booking::Column::CheckIn)
            .into_model::<CalendarEntry>()
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Management listing, optionally narrowed by status and facility.
    pub async fn list_all(
        &self,
        status: Option<BookingStatus>,
        facility_id: Option<i32>,
    ) -> AppResult<Vec<booking::Model>> {
        let mut query = booking::Entity::find();
        if let Some(status) = status {
            query = query.filter(booking::Column::Status.eq(status));
        }
        if let Some(facility_id) = facility_id {
            query = query.filter(booking::Column::FacilityId.eq(facility_id));
        }

        let bookings = query
            .order_by_asc(booking::Column::CheckIn)
            .all(&self.db)
            .await?;
        Ok(bookings)
    }

    async fn load_with_details(&self, ids: &[i32]) -> AppResult<Vec<BookingWithDetails>> {
        let mut loaded: Vec<BookingWithDetails> = booking::Entity::find()
            .filter(booking::Column::Id.is_in(ids.iter().copied()))
            .find_with_related(booking_detail::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(booking, details)| BookingWithDetails { booking, details })
            .collect();
        loaded.sort_by_key(|b| b.booking.check_in);
        Ok(loaded)
    }
}

// ============ Transaction bodies ============

async fn persist_series(
    txn: &DatabaseTransaction,
    requester: Uuid,
    request: &BookingRequest,
    plan: &Plan,
    parent_booking_id: Option<i32>,
) -> AppResult<Series> {
    let facility = lock_facility(txn, request.facility_id).await?;
    if facility.status != FacilityStatus::Available {
        return Err(AppError::InvalidArgument(format!(
            "{} cannot be booked while it is {:?}",
            facility.name, facility.status
        )));
    }

    let lines = inventory::validate(txn, &request.equipment).await?;
    let equipment_total: i64 = lines.iter().map(ReservedLine::subtotal).sum();
    let slots = slot::slot_count(request.start_slot, request.end_slot);
    let purpose = request.purpose.trim().to_string();

    let mut bookings = Vec::with_capacity(plan.dates.len());
    for (index, date) in plan.dates.iter().copied().enumerate() {
        let (check_in, check_out) =
            slot::interval_for_range(date, request.start_slot, request.end_slot);
        availability::ensure_available(txn, &facility, date, check_in, check_out, None).await?;

        let booking = booking::ActiveModel {
            requester_id: Set(requester),
            facility_id: Set(facility.id),
            purpose: Set(purpose.clone()),
            category: Set(request.category),
            status: Set(BookingStatus::Pending),
            check_in: Set(check_in),
            check_out: Set(check_out),
            total_amount: Set(facility_charge(&facility, slots, index == 0) + equipment_total),
            cancellation_reason: Set(None),
            cancelled_at: Set(None),
            rejection_reason: Set(None),
            recurrence_group_id: Set(plan.recurrence_group_id),
            parent_booking_id: Set(parent_booking_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| availability::translate_write_error(e, &facility.name, date))?;

        let mut details = Vec::with_capacity(lines.len());
        for line in &lines {
            let detail = booking_detail::ActiveModel {
                booking_id: Set(booking.id),
                equipment_id: Set(line.equipment_id),
                quantity: Set(line.quantity),
                note: Set(line.note.clone()),
                unit_price: Set(line.unit_price),
            }
            .insert(txn)
            .await?;
            details.push(detail);
        }

        bookings.push(BookingWithDetails { booking, details });
    }

    let first_date = plan.dates.first().copied().unwrap_or(request.date);
    Ok(Series {
        facility,
        first_date,
        bookings,
    })
}

async fn supersede_and_persist(
    txn: &DatabaseTransaction,
    old_id: i32,
    requester: Uuid,
    request: &BookingRequest,
    plan: &Plan,
) -> AppResult<(BookingStatus, Series)> {
    let old = find_booking(txn, old_id).await?;
    if old.requester_id != requester {
        return Err(AppError::Forbidden(
            "You can only reschedule your own bookings".to_string(),
        ));
    }

    lifecycle::apply(txn, &old, Transition::Supersede, None).await?;
    let series = persist_series(txn, requester, request, plan, Some(old.id)).await?;
    Ok((old.status, series))
}

async fn approve_in(
    txn: &DatabaseTransaction,
    booking_id: i32,
) -> AppResult<(facility::Model, booking::Model)> {
    let pending = find_booking(txn, booking_id).await?;
    lifecycle::check(pending.status, Transition::Approve)?;

    let facility = lock_facility(txn, pending.facility_id).await?;
    let date = pending.check_in.date();
    availability::ensure_available(
        txn,
        &facility,
        date,
        pending.check_in,
        pending.check_out,
        Some(pending.id),
    )
    .await?;

    let approved = lifecycle::apply(txn, &pending, Transition::Approve, None)
        .await
        .map_err(|err| match err {
            AppError::Database(db_err) => {
                availability::translate_write_error(db_err, &facility.name, date)
            }
            other => other,
        })?;

    Ok((facility, approved))
}

async fn cancel_series_in(
    txn: &DatabaseTransaction,
    group_id: Uuid,
    actor: &Actor,
    reason: Option<String>,
) -> AppResult<Vec<(BookingStatus, booking::Model)>> {
    let occurrences = booking::Entity::find()
        .filter(booking::Column::RecurrenceGroupId.eq(group_id))
        .order_by_asc(booking::Column::CheckIn)
        .all(txn)
        .await?;

    let Some(first) = occurrences.first() else {
        return Err(AppError::NotFound(format!("Series {} not found", group_id)));
    };
    for occurrence in &occurrences {
        actor.authorize(occurrence)?;
    }

    let mut changed = Vec::new();
    // Superseded occurrences stay as they are; only live ones are cancelled.
    for occurrence in occurrences.iter().filter(|b| !b.status.is_terminal()) {
        let cancelled = lifecycle::apply(txn, occurrence, Transition::Cancel, reason.clone()).await?;
        changed.push((occurrence.status, cancelled));
    }

    if changed.is_empty() {
        return Err(AppError::InvalidTransition {
            action: Transition::Cancel.verb(),
            status: first.status,
        });
    }
    Ok(changed)
}

// ============ Helpers ============

async fn commit_series(txn: DatabaseTransaction, outcome: AppResult<Series>) -> AppResult<Series> {
    let series = match outcome {
        Ok(series) => series,
        Err(err) => {
            rollback(txn).await;
            return Err(err);
        }
    };

    txn.commit().await.map_err(|e| {
        availability::translate_write_error(e, &series.facility.name, series.first_date)
    })?;
    Ok(series)
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        tracing::warn!(error = %err, "Rollback failed; the connection will discard the transaction");
    }
}

async fn find_booking<C: ConnectionTrait>(conn: &C, booking_id: i32) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
}

/// Load the facility, holding its row lock on Postgres so requests for the
/// same facility queue behind each other.
async fn lock_facility<C: ConnectionTrait>(conn: &C, facility_id: i32) -> AppResult<facility::Model> {
    let mut query = facility::Entity::find_by_id(facility_id);
    if conn.get_database_backend() == DatabaseBackend::Postgres {
        query = query.lock_exclusive();
    }

    query
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", facility_id)))
}

/// Facility part of one occurrence's amount.
fn facility_charge(facility: &facility::Model, slots: i64, first_occurrence: bool) -> i64 {
    match facility.price_type {
        PriceType::Hourly => facility.price * slots,
        PriceType::PerBooking => facility.price,
        PriceType::OneTime if first_occurrence => facility.price,
        PriceType::OneTime => 0,
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
