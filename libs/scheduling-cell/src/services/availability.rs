// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::{AvailabilityView, DateRange, Interval};
use crate::store::{ProviderSchedule, ScheduleStore};

/// Decides bookable/not-bookable by combining a provider's blocked
/// intervals with their non-cancelled appointments.
pub struct AvailabilityService {
    store: Arc<ScheduleStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<ScheduleStore>) -> Self {
        Self { store }
    }

    /// Read-path bookability check. Advisory only: the booking
    /// coordinator re-runs the same predicate under the provider lock
    /// before inserting.
    pub async fn is_bookable(&self, provider_id: Uuid, interval: &Interval) -> bool {
        let schedule = self.store.schedule_for(provider_id).await;
        let schedule = schedule.lock().await;
        let bookable = Self::slot_is_free(&schedule, interval, None);

        debug!(
            "Availability check for provider {} at {}: {}",
            provider_id,
            interval,
            if bookable { "bookable" } else { "occupied" }
        );
        bookable
    }

    /// The single bookability predicate shared by the read path and the
    /// write path. A provider's declared unavailability always wins;
    /// after that, any non-cancelled appointment occupies its slot
    /// (PENDING holds are exclusive, see the booking coordinator).
    pub(crate) fn slot_is_free(
        schedule: &ProviderSchedule,
        interval: &Interval,
        exclude: Option<Uuid>,
    ) -> bool {
        schedule.blocking_conflict(interval).is_none()
            && schedule.appointment_conflict(interval, exclude).is_none()
    }

    /// Composite schedule view for rendering a calendar. Enforces no
    /// invariants; cancelled appointments are included so staff can see
    /// freed slots.
    pub async fn get_availability(&self, provider_id: Uuid, range: DateRange) -> AvailabilityView {
        let schedule = self.store.schedule_for(provider_id).await;
        let schedule = schedule.lock().await;

        AvailabilityView {
            blocked_intervals: schedule.blocks_in_range(&range),
            appointments: schedule.appointments_in_range(&range),
        }
    }
}
