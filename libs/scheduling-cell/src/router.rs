// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::SchedulingCell;

pub fn scheduling_routes(cell: Arc<SchedulingCell>) -> Router {
    Router::new()
        // Provider-declared unavailability
        .route("/blocks", post(handlers::block_interval))
        .route("/blocks/{block_id}", delete(handlers::unblock_interval))
        .route("/providers/{provider_id}/blocks", get(handlers::list_blocked))
        // Availability resolution
        .route(
            "/providers/{provider_id}/bookable",
            get(handlers::check_bookable),
        )
        .route(
            "/providers/{provider_id}/availability",
            get(handlers::get_availability),
        )
        .route(
            "/providers/{provider_id}/appointments",
            get(handlers::list_appointments),
        )
        // Booking and lifecycle
        .route("/appointments", post(handlers::request_appointment))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/appointments/{appointment_id}",
            delete(handlers::delete_appointment),
        )
        .route(
            "/appointments/{appointment_id}/transition",
            post(handlers::transition_status),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        // Billing
        .route(
            "/appointments/{appointment_id}/bill",
            post(handlers::generate_bill).get(handlers::get_bill),
        )
        // Notifications
        .route(
            "/notifications/{recipient_id}",
            get(handlers::list_notifications),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(handlers::mark_notification_read),
        )
        .with_state(cell)
}
