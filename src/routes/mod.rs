use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{admin, bookings, facilities};
use crate::middleware::auth::{auth_middleware, require_manager};
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let member_governor = create_role_governor(RateLimitedRole::Member);

    // Facility calendar (any authenticated caller)
    let facility_routes = Router::new()
        .route("/{id}/bookings", get(facilities::facility_calendar))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Booking routes (any authenticated caller, limited per user)
    // Rate limit: 100 requests per minute
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking).get(bookings::my_bookings))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .route("/{id}/reschedule", post(bookings::reschedule_booking))
        .route("/series/{group_id}", get(bookings::get_series))
        .route("/series/{group_id}/cancel", post(bookings::cancel_series))
        .layer(member_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Management routes (requires auth + manager or admin role)
    let admin_routes = Router::new()
        .route("/bookings", get(admin::list_all_bookings))
        .route("/bookings/{id}/approve", post(admin::approve_booking))
        .route("/bookings/{id}/reject", post(admin::reject_booking))
        .route("/bookings/{id}/complete", post(admin::complete_booking))
        .layer(middleware::from_fn(require_manager))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/facilities", facility_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
