use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveTime;
use uuid::Uuid;

use scheduling_cell::models::{
    ActorRole, Appointment, AppointmentStatus, BillStatus, BookAppointmentRequest, ClinicHours,
    NotificationKind, SchedulingError,
};
use scheduling_cell::services::directory::StaticProviderDirectory;
use scheduling_cell::services::notify::{DeliveryError, LoggingNotificationSink, NotificationSink};
use scheduling_cell::SchedulingCell;

async fn create_test_cell_with_sink(
    sink: Arc<dyn NotificationSink>,
) -> (Arc<SchedulingCell>, Uuid, Uuid) {
    let directory = Arc::new(StaticProviderDirectory::new());
    let provider_id = Uuid::new_v4();
    let subject_id = Uuid::new_v4();
    directory.register(provider_id, true).await;

    let cell = Arc::new(SchedulingCell::new(ClinicHours::default(), directory, sink));
    (cell, provider_id, subject_id)
}

async fn create_test_cell() -> (Arc<SchedulingCell>, Uuid, Uuid) {
    create_test_cell_with_sink(Arc::new(LoggingNotificationSink)).await
}

async fn book(cell: &SchedulingCell, provider_id: Uuid, subject_id: Uuid) -> Appointment {
    cell.booking
        .request_appointment(BookAppointmentRequest {
            provider_id,
            subject_id,
            date: "2024-06-01".parse().unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            reason: Some("checkup".to_string()),
            notes: None,
        })
        .await
        .unwrap()
}

// ==============================================================================
// STATUS TRANSITIONS THROUGH THE FULL ENGINE
// ==============================================================================

#[tokio::test]
async fn confirm_then_cancel_then_terminal() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    let confirmed = cell
        .booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let cancelled = cell
        .booking
        .transition_status(
            appointment.id,
            AppointmentStatus::Cancelled,
            ActorRole::Receptionist,
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    // Terminal: no way back.
    let result = cell
        .booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await;
    assert_matches!(
        result,
        Err(SchedulingError::TerminalState(AppointmentStatus::Cancelled))
    );
}

#[tokio::test]
async fn subject_may_only_withdraw_a_pending_request() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    let result = cell
        .booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Subject)
        .await;
    assert_matches!(result, Err(SchedulingError::Forbidden));

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();

    // Once confirmed, cancellation is a staff action.
    let result = cell
        .booking
        .cancel(appointment.id, ActorRole::Subject, None)
        .await;
    assert_matches!(result, Err(SchedulingError::Forbidden));
}

#[tokio::test]
async fn completion_requires_prior_confirmation() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    let result = cell
        .booking
        .transition_status(appointment.id, AppointmentStatus::Completed, ActorRole::Provider)
        .await;
    assert_matches!(
        result,
        Err(SchedulingError::IllegalTransition {
            from: AppointmentStatus::Pending,
            to: AppointmentStatus::Completed,
        })
    );
}

#[tokio::test]
async fn transition_to_current_status_is_rejected() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    let result = cell
        .booking
        .transition_status(appointment.id, AppointmentStatus::Pending, ActorRole::Provider)
        .await;
    assert_matches!(result, Err(SchedulingError::IllegalTransition { .. }));
}

#[tokio::test]
async fn unknown_appointment_transition_fails() {
    let (cell, _, _) = create_test_cell().await;

    let result = cell
        .booking
        .transition_status(Uuid::new_v4(), AppointmentStatus::Confirmed, ActorRole::Provider)
        .await;
    assert_matches!(result, Err(SchedulingError::NotFound));
}

#[tokio::test]
async fn confirmation_and_cancellation_notify_the_subject() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();
    cell.booking
        .cancel(appointment.id, ActorRole::Provider, None)
        .await
        .unwrap();

    let notifications = cell.notifications.list_for_recipient(subject_id).await;
    let kinds: Vec<NotificationKind> = notifications.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::AppointmentConfirmed,
            NotificationKind::AppointmentCancelled,
        ]
    );
}

#[tokio::test]
async fn completing_an_appointment_does_not_notify() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();
    let before = cell.notifications.list_for_recipient(subject_id).await.len();

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Completed, ActorRole::Provider)
        .await
        .unwrap();
    let after = cell.notifications.list_for_recipient(subject_id).await.len();
    assert_eq!(before, after);
}

// ==============================================================================
// NOTIFICATION DELIVERY AND MAILBOX
// ==============================================================================

struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(
        &self,
        _recipient_id: Uuid,
        _kind: NotificationKind,
        _payload: &str,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError("smtp relay unreachable".to_string()))
    }
}

#[tokio::test]
async fn sink_failure_never_fails_the_operation() {
    let (cell, provider_id, subject_id) = create_test_cell_with_sink(Arc::new(FailingSink)).await;

    let appointment = book(&cell, provider_id, subject_id).await;
    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();

    // The record is still persisted for later pickup.
    let notifications = cell.notifications.list_for_recipient(subject_id).await;
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn mark_read_checks_mailbox_ownership() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    book(&cell, provider_id, subject_id).await;

    let notifications = cell.notifications.list_for_recipient(provider_id).await;
    let notification_id = notifications[0].id;

    let result = cell.notifications.mark_read(notification_id, subject_id).await;
    assert_matches!(result, Err(SchedulingError::Forbidden));
    // The failed attempt must not flip the flag.
    let notifications = cell.notifications.list_for_recipient(provider_id).await;
    assert!(!notifications[0].is_read);

    let updated = cell
        .notifications
        .mark_read(notification_id, provider_id)
        .await
        .unwrap();
    assert!(updated.is_read);

    let result = cell.notifications.mark_read(Uuid::new_v4(), provider_id).await;
    assert_matches!(result, Err(SchedulingError::NotFound));
}

// ==============================================================================
// BILLING
// ==============================================================================

#[tokio::test]
async fn bill_requires_completed_appointment() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    let result = cell
        .billing
        .generate_bill(appointment.id, 120.0, "consultation".to_string())
        .await;
    assert_matches!(result, Err(SchedulingError::NotEligible));

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();
    let result = cell
        .billing
        .generate_bill(appointment.id, 120.0, "consultation".to_string())
        .await;
    assert_matches!(result, Err(SchedulingError::NotEligible));

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Completed, ActorRole::Provider)
        .await
        .unwrap();
    let bill = cell
        .billing
        .generate_bill(appointment.id, 120.0, "consultation".to_string())
        .await
        .unwrap();
    assert_eq!(bill.status, BillStatus::Issued);
    assert_eq!(bill.appointment_id, appointment.id);
}

#[tokio::test]
async fn regenerating_a_bill_updates_in_place() {
    let (cell, provider_id, subject_id) = create_test_cell().await;
    let appointment = book(&cell, provider_id, subject_id).await;

    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Confirmed, ActorRole::Provider)
        .await
        .unwrap();
    cell.booking
        .transition_status(appointment.id, AppointmentStatus::Completed, ActorRole::Provider)
        .await
        .unwrap();

    let first = cell
        .billing
        .generate_bill(appointment.id, 120.0, "consultation".to_string())
        .await
        .unwrap();
    let second = cell
        .billing
        .generate_bill(appointment.id, 150.0, "consultation, extended".to_string())
        .await
        .unwrap();

    // Idempotent upsert: one bill per appointment, original issue date kept.
    assert_eq!(second.amount, 150.0);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);

    let fetched = cell.billing.get_bill(appointment.id).await.unwrap();
    assert_eq!(fetched.amount, 150.0);
}

#[tokio::test]
async fn bill_lookup_for_unknown_appointment_fails() {
    let (cell, _, _) = create_test_cell().await;

    let result = cell.billing.get_bill(Uuid::new_v4()).await;
    assert_matches!(result, Err(SchedulingError::NotFound));
}
