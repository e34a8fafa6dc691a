// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    ActorRole, Appointment, AppointmentStatus, BookAppointmentRequest, ClinicHours, DateRange,
    Interval, Notification, NotificationKind, SchedulingError,
};
use crate::services::availability::AvailabilityService;
use crate::services::directory::ProviderDirectory;
use crate::services::lifecycle::StatusStateMachine;
use crate::services::notify::NotificationSink;
use crate::store::ScheduleStore;

/// Serializes concurrent booking attempts per provider and owns the
/// create/transition/cancel API.
///
/// Write-time invariant: no two non-cancelled appointments for the same
/// provider ever hold overlapping intervals. A PENDING hold therefore
/// excludes competing requests for its slot; losers get SlotUnavailable
/// and are expected to re-query availability, never retried here.
pub struct BookingService {
    store: Arc<ScheduleStore>,
    directory: Arc<dyn ProviderDirectory>,
    sink: Arc<dyn NotificationSink>,
    state_machine: StatusStateMachine,
    hours: ClinicHours,
}

impl BookingService {
    pub fn new(
        store: Arc<ScheduleStore>,
        directory: Arc<dyn ProviderDirectory>,
        sink: Arc<dyn NotificationSink>,
        hours: ClinicHours,
    ) -> Self {
        Self {
            store,
            directory,
            sink,
            state_machine: StatusStateMachine::new(),
            hours,
        }
    }

    /// Create a PENDING appointment if the slot is free.
    ///
    /// The bookability re-check and the insert run under the provider's
    /// schedule lock as one unit; two racing requests for the same slot
    /// resolve to exactly one PENDING appointment.
    pub async fn request_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Booking request for provider {} by subject {}",
            request.provider_id, request.subject_id
        );

        if !self.directory.provider_exists(request.provider_id).await {
            warn!("Booking request for unknown provider {}", request.provider_id);
            return Err(SchedulingError::NotFound);
        }
        if !self.directory.is_schedulable_role(request.provider_id).await {
            warn!(
                "Booking request for non-schedulable resource {}",
                request.provider_id
            );
            return Err(SchedulingError::NotFound);
        }

        let interval = Interval::new(request.date, request.start_time, request.end_time)?;
        if !interval.within_hours(&self.hours) {
            return Err(SchedulingError::InvalidInterval(format!(
                "interval {} falls outside clinic hours {}-{}",
                interval,
                self.hours.open.format("%H:%M"),
                self.hours.close.format("%H:%M"),
            )));
        }
        // slot_minutes of 0 means no grid is configured.
        if self.hours.slot_minutes != 0
            && interval.duration_minutes() % i64::from(self.hours.slot_minutes) != 0
        {
            return Err(SchedulingError::InvalidInterval(format!(
                "duration must be a multiple of {} minutes",
                self.hours.slot_minutes
            )));
        }

        let appointment = {
            let schedule = self.store.schedule_for(request.provider_id).await;
            let mut schedule = schedule.lock().await;

            if !AvailabilityService::slot_is_free(&schedule, &interval, None) {
                debug!(
                    "Slot {} on provider {} lost to a block or earlier booking",
                    interval, request.provider_id
                );
                return Err(SchedulingError::SlotUnavailable);
            }

            let now = Utc::now();
            let appointment = Appointment {
                id: Uuid::new_v4(),
                provider_id: request.provider_id,
                subject_id: request.subject_id,
                interval,
                status: AppointmentStatus::Pending,
                reason: request.reason,
                notes: request.notes,
                created_at: now,
                updated_at: now,
            };
            schedule
                .appointments
                .insert(appointment.id, appointment.clone());
            appointment
        };

        self.store
            .index_appointment(appointment.id, appointment.provider_id)
            .await;

        // Best-effort: the booking stands even if nobody hears about it.
        self.emit_notification(
            appointment.provider_id,
            &appointment,
            NotificationKind::BookingRequested,
            format!("Booking requested for {}", appointment.interval),
        )
        .await;

        info!(
            "Appointment {} created PENDING for provider {} at {}",
            appointment.id, appointment.provider_id, appointment.interval
        );
        Ok(appointment)
    }

    /// Move an appointment through the status state machine.
    ///
    /// Transitions for one appointment are serialized by its provider's
    /// schedule lock: of two racing confirm/cancel calls one wins and
    /// the other observes the committed status.
    pub async fn transition_status(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        actor_role: ActorRole,
    ) -> Result<Appointment, SchedulingError> {
        self.apply_transition(appointment_id, target, actor_role, None)
            .await
    }

    /// The CANCELLED transition with the caller's role. A supplied
    /// reason is appended to the appointment's notes for the audit
    /// trail, in the same locked write as the status change.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        actor_role: ActorRole,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        self.apply_transition(
            appointment_id,
            AppointmentStatus::Cancelled,
            actor_role,
            reason,
        )
        .await
    }

    /// Legal next statuses for an appointment in the given status,
    /// role-independent. Used by the appointment view to render
    /// available actions.
    pub fn transition_targets(&self, status: AppointmentStatus) -> Vec<AppointmentStatus> {
        self.state_machine.valid_targets(status)
    }

    async fn apply_transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        actor_role: ActorRole,
        cancel_reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        let (_, schedule) = self
            .store
            .schedule_of_appointment(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;

        let updated = {
            let mut schedule = schedule.lock().await;

            let current = schedule
                .appointments
                .get(&appointment_id)
                .ok_or(SchedulingError::NotFound)?;

            self.state_machine
                .authorize_transition(current.status, target, actor_role)?;

            // Single-CONFIRMED-per-slot guard, re-checked at write time.
            if target == AppointmentStatus::Confirmed
                && schedule
                    .confirmed_conflict(&current.interval, Some(appointment_id))
                    .is_some()
            {
                return Err(SchedulingError::SlotUnavailable);
            }

            let appointment = schedule
                .appointments
                .get_mut(&appointment_id)
                .ok_or(SchedulingError::NotFound)?;
            appointment.status = target;
            if let Some(reason) = cancel_reason {
                let note = format!("cancelled: {reason}");
                appointment.notes = Some(match appointment.notes.take() {
                    Some(existing) => format!("{existing}\n{note}"),
                    None => note,
                });
            }
            appointment.updated_at = Utc::now();
            appointment.clone()
        };

        if let Some(kind) = self.state_machine.notification_for(target) {
            self.emit_notification(
                updated.subject_id,
                &updated,
                kind,
                format!("Appointment at {} is now {}", updated.interval, target),
            )
            .await;
        }

        info!(
            "Appointment {} transitioned to {} by {}",
            appointment_id, target, actor_role
        );
        Ok(updated)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let (_, schedule) = self
            .store
            .schedule_of_appointment(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;
        let schedule = schedule.lock().await;
        schedule
            .appointments
            .get(&appointment_id)
            .cloned()
            .ok_or(SchedulingError::NotFound)
    }

    pub async fn list_appointments(&self, provider_id: Uuid, range: DateRange) -> Vec<Appointment> {
        let schedule = self.store.schedule_for(provider_id).await;
        let schedule = schedule.lock().await;
        schedule.appointments_in_range(&range)
    }

    /// Hard removal, distinct from cancellation. Administrative roles
    /// only; purges the appointment's bill and notifications with it.
    pub async fn delete_appointment(
        &self,
        appointment_id: Uuid,
        actor_role: ActorRole,
    ) -> Result<(), SchedulingError> {
        if actor_role != ActorRole::Administrator {
            warn!(
                "Role {} attempted hard delete of appointment {}",
                actor_role, appointment_id
            );
            return Err(SchedulingError::Forbidden);
        }

        let (_, schedule) = self
            .store
            .schedule_of_appointment(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;

        {
            let mut schedule = schedule.lock().await;
            schedule
                .appointments
                .remove(&appointment_id)
                .ok_or(SchedulingError::NotFound)?;
        }

        self.store.forget_appointment(appointment_id).await;
        self.store.remove_bill(appointment_id).await;
        self.store
            .remove_notifications_for_appointment(appointment_id)
            .await;

        info!("Appointment {} purged by administrator", appointment_id);
        Ok(())
    }

    /// Persist the notification record, then attempt delivery. Delivery
    /// failure is logged and swallowed; the record stays either way.
    async fn emit_notification(
        &self,
        recipient_id: Uuid,
        appointment: &Appointment,
        kind: NotificationKind,
        message: String,
    ) {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id,
            appointment_id: appointment.id,
            kind,
            message: message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.store.push_notification(notification).await;

        if let Err(e) = self.sink.notify(recipient_id, kind, &message).await {
            warn!(
                "Notification delivery failed for appointment {}: {}",
                appointment.id, e
            );
        }
    }
}
