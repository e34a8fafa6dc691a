// libs/scheduling-cell/src/store.rs
//
// In-memory schedule store. One mutex per provider serializes every
// check-then-write sequence touching that provider's calendar, which is
// the concurrency contract booking and status transitions rely on.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, Bill, BlockedInterval, DateRange, Interval, Notification,
};

/// Everything booked or blocked on a single provider's calendar.
///
/// Only ever touched while holding the provider's schedule lock; the
/// helper predicates are pure so callers can re-check under that lock.
#[derive(Debug, Default)]
pub struct ProviderSchedule {
    pub appointments: HashMap<Uuid, Appointment>,
    pub blocked: HashMap<Uuid, BlockedInterval>,
}

impl ProviderSchedule {
    /// Any provider-declared block overlapping the interval.
    pub fn blocking_conflict(&self, interval: &Interval) -> Option<&BlockedInterval> {
        self.blocked
            .values()
            .find(|block| block.interval.overlaps(interval))
    }

    /// Any non-cancelled appointment overlapping the interval.
    pub fn appointment_conflict(
        &self,
        interval: &Interval,
        exclude: Option<Uuid>,
    ) -> Option<&Appointment> {
        self.appointments.values().find(|appt| {
            Some(appt.id) != exclude && appt.occupies_slot() && appt.interval.overlaps(interval)
        })
    }

    /// Any CONFIRMED appointment overlapping the interval.
    pub fn confirmed_conflict(
        &self,
        interval: &Interval,
        exclude: Option<Uuid>,
    ) -> Option<&Appointment> {
        self.appointments.values().find(|appt| {
            Some(appt.id) != exclude
                && appt.status == AppointmentStatus::Confirmed
                && appt.interval.overlaps(interval)
        })
    }

    /// Blocks inside the range, ordered by date then start time.
    pub fn blocks_in_range(&self, range: &DateRange) -> Vec<BlockedInterval> {
        let mut blocks: Vec<BlockedInterval> = self
            .blocked
            .values()
            .filter(|block| range.contains(block.interval.date))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.interval.date, b.interval.start_time));
        blocks
    }

    /// Appointments inside the range, ordered by date then start time.
    pub fn appointments_in_range(&self, range: &DateRange) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|appt| range.contains(appt.interval.date))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.interval.date, a.interval.start_time));
        appointments
    }
}

/// Process-wide scheduling state shared by all request workers.
pub struct ScheduleStore {
    schedules: RwLock<HashMap<Uuid, Arc<Mutex<ProviderSchedule>>>>,
    appointment_index: RwLock<HashMap<Uuid, Uuid>>,
    block_index: RwLock<HashMap<Uuid, Uuid>>,
    bills: Mutex<HashMap<Uuid, Bill>>,
    notifications: Mutex<Vec<Notification>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self {
            schedules: RwLock::new(HashMap::new()),
            appointment_index: RwLock::new(HashMap::new()),
            block_index: RwLock::new(HashMap::new()),
            bills: Mutex::new(HashMap::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    /// Handle to a provider's schedule lock, created lazily.
    pub async fn schedule_for(&self, provider_id: Uuid) -> Arc<Mutex<ProviderSchedule>> {
        if let Some(schedule) = self.schedules.read().await.get(&provider_id) {
            return Arc::clone(schedule);
        }
        let mut schedules = self.schedules.write().await;
        Arc::clone(schedules.entry(provider_id).or_default())
    }

    /// Resolve an appointment id to the provider schedule holding it.
    pub async fn schedule_of_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Option<(Uuid, Arc<Mutex<ProviderSchedule>>)> {
        let provider_id = *self.appointment_index.read().await.get(&appointment_id)?;
        Some((provider_id, self.schedule_for(provider_id).await))
    }

    pub async fn index_appointment(&self, appointment_id: Uuid, provider_id: Uuid) {
        self.appointment_index
            .write()
            .await
            .insert(appointment_id, provider_id);
    }

    pub async fn forget_appointment(&self, appointment_id: Uuid) {
        self.appointment_index.write().await.remove(&appointment_id);
    }

    /// Resolve a block id to the provider schedule holding it.
    pub async fn schedule_of_block(
        &self,
        block_id: Uuid,
    ) -> Option<(Uuid, Arc<Mutex<ProviderSchedule>>)> {
        let provider_id = *self.block_index.read().await.get(&block_id)?;
        Some((provider_id, self.schedule_for(provider_id).await))
    }

    pub async fn index_block(&self, block_id: Uuid, provider_id: Uuid) {
        self.block_index.write().await.insert(block_id, provider_id);
    }

    pub async fn forget_block(&self, block_id: Uuid) {
        self.block_index.write().await.remove(&block_id);
    }

    // ---- bills (keyed 1:1 to appointments) ----

    pub async fn get_bill(&self, appointment_id: Uuid) -> Option<Bill> {
        self.bills.lock().await.get(&appointment_id).cloned()
    }

    pub async fn put_bill(&self, bill: Bill) {
        self.bills.lock().await.insert(bill.appointment_id, bill);
    }

    pub async fn remove_bill(&self, appointment_id: Uuid) {
        self.bills.lock().await.remove(&appointment_id);
    }

    // ---- notifications (owned by the recipient) ----

    pub async fn push_notification(&self, notification: Notification) {
        self.notifications.lock().await.push(notification);
    }

    pub async fn notifications_for(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.notifications
            .lock()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }

    pub async fn find_notification(&self, notification_id: Uuid) -> Option<Notification> {
        self.notifications
            .lock()
            .await
            .iter()
            .find(|n| n.id == notification_id)
            .cloned()
    }

    /// Flip is_read, the only field that may change after creation.
    pub async fn mark_notification_read(&self, notification_id: Uuid) -> Option<Notification> {
        let mut notifications = self.notifications.lock().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)?;
        notification.is_read = true;
        Some(notification.clone())
    }

    /// Drop every notification referencing an appointment. Used when an
    /// appointment is purged by an administrator.
    pub async fn remove_notifications_for_appointment(&self, appointment_id: Uuid) {
        self.notifications
            .lock()
            .await
            .retain(|n| n.appointment_id != appointment_id);
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}
