// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    ActorRole, BlockIntervalRequest, BookAppointmentRequest, CancelAppointmentRequest, DateRange,
    GenerateBillRequest, Interval, SchedulingError, TransitionRequest,
};
use crate::SchedulingCell;

impl From<SchedulingError> for AppError {
    fn from(e: SchedulingError) -> Self {
        match e {
            SchedulingError::NotFound => AppError::NotFound(e.to_string()),
            SchedulingError::Forbidden => AppError::Forbidden(e.to_string()),
            SchedulingError::InvalidInterval(_) => AppError::BadRequest(e.to_string()),
            // Distinguishable through the stable message; all state
            // conflicts share the 409 status.
            SchedulingError::SlotUnavailable
            | SchedulingError::Conflict
            | SchedulingError::IllegalTransition { .. }
            | SchedulingError::TerminalState(_)
            | SchedulingError::NotEligible => AppError::Conflict(e.to_string()),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl From<DateRangeParams> for DateRange {
    fn from(params: DateRangeParams) -> Self {
        DateRange {
            from: params.from,
            to: params.to,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookableQuery {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct UnblockQuery {
    pub provider_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub struct RecipientQuery {
    pub recipient_id: Uuid,
}

// ==============================================================================
// BLOCKED-INTERVAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn block_interval(
    State(cell): State<Arc<SchedulingCell>>,
    Json(request): Json<BlockIntervalRequest>,
) -> Result<Json<Value>, AppError> {
    let block = cell.blocking.block(request).await?;
    Ok(Json(json!({ "blocked_interval": block })))
}

#[axum::debug_handler]
pub async fn unblock_interval(
    State(cell): State<Arc<SchedulingCell>>,
    Path(block_id): Path<Uuid>,
    Query(query): Query<UnblockQuery>,
) -> Result<Json<Value>, AppError> {
    cell.blocking.unblock(block_id, query.provider_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn list_blocked(
    State(cell): State<Arc<SchedulingCell>>,
    Path(provider_id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Value>, AppError> {
    let blocks = cell.blocking.list_blocked(provider_id, range.into()).await;
    Ok(Json(json!({ "blocked_intervals": blocks })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_bookable(
    State(cell): State<Arc<SchedulingCell>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<BookableQuery>,
) -> Result<Json<Value>, AppError> {
    let interval = Interval::new(query.date, query.start_time, query.end_time)
        .map_err(AppError::from)?;
    let bookable = cell.availability.is_bookable(provider_id, &interval).await;
    Ok(Json(json!({ "bookable": bookable })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(cell): State<Arc<SchedulingCell>>,
    Path(provider_id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Value>, AppError> {
    let view = cell
        .availability
        .get_availability(provider_id, range.into())
        .await;
    Ok(Json(json!({ "availability": view })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn request_appointment(
    State(cell): State<Arc<SchedulingCell>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell.booking.request_appointment(request).await?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell.booking.get_appointment(appointment_id).await?;
    let valid_targets = cell.booking.transition_targets(appointment.status);
    Ok(Json(json!({
        "appointment": appointment,
        "valid_targets": valid_targets,
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(cell): State<Arc<SchedulingCell>>,
    Path(provider_id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Value>, AppError> {
    let appointments = cell
        .booking
        .list_appointments(provider_id, range.into())
        .await;
    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn transition_status(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .transition_status(appointment_id, request.target, request.actor_role)
        .await?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .cancel(appointment_id, request.actor_role, request.reason)
        .await?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Value>, AppError> {
    cell.booking
        .delete_appointment(appointment_id, query.actor_role)
        .await?;
    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// BILLING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn generate_bill(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<GenerateBillRequest>,
) -> Result<Json<Value>, AppError> {
    let bill = cell
        .billing
        .generate_bill(appointment_id, request.amount, request.description)
        .await?;
    Ok(Json(json!({ "bill": bill })))
}

#[axum::debug_handler]
pub async fn get_bill(
    State(cell): State<Arc<SchedulingCell>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let bill = cell.billing.get_bill(appointment_id).await?;
    Ok(Json(json!({ "bill": bill })))
}

// ==============================================================================
// NOTIFICATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_notifications(
    State(cell): State<Arc<SchedulingCell>>,
    Path(recipient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let notifications = cell.notifications.list_for_recipient(recipient_id).await;
    Ok(Json(json!({ "notifications": notifications })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(cell): State<Arc<SchedulingCell>>,
    Path(notification_id): Path<Uuid>,
    Query(query): Query<RecipientQuery>,
) -> Result<Json<Value>, AppError> {
    let notification = cell
        .notifications
        .mark_read(notification_id, query.recipient_id)
        .await?;
    Ok(Json(json!({ "notification": notification })))
}
