// libs/scheduling-cell/src/services/blocking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BlockIntervalRequest, BlockedInterval, DateRange, Interval, SchedulingError};
use crate::store::ScheduleStore;

/// Provider-declared unavailability. Blocks exist independently of
/// appointments and always win during availability resolution.
pub struct BlockingService {
    store: Arc<ScheduleStore>,
}

impl BlockingService {
    pub fn new(store: Arc<ScheduleStore>) -> Self {
        Self { store }
    }

    /// Declare an interval unavailable. Fails with Conflict if a live
    /// (non-cancelled) appointment already overlaps it: time off must
    /// not clobber existing bookings. The check runs once, at creation.
    pub async fn block(
        &self,
        request: BlockIntervalRequest,
    ) -> Result<BlockedInterval, SchedulingError> {
        let interval = Interval::new(request.date, request.start_time, request.end_time)?;

        let schedule = self.store.schedule_for(request.provider_id).await;
        let mut schedule = schedule.lock().await;

        if let Some(appointment) = schedule.appointment_conflict(&interval, None) {
            warn!(
                "Provider {} tried to block {} over live appointment {}",
                request.provider_id, interval, appointment.id
            );
            return Err(SchedulingError::Conflict);
        }

        let block = BlockedInterval {
            id: Uuid::new_v4(),
            provider_id: request.provider_id,
            interval,
            reason: request.reason,
            created_at: Utc::now(),
        };
        schedule.blocked.insert(block.id, block.clone());
        drop(schedule);

        self.store.index_block(block.id, block.provider_id).await;

        info!(
            "Provider {} blocked {} ({})",
            block.provider_id,
            block.interval,
            block.reason.as_deref().unwrap_or("no reason")
        );
        Ok(block)
    }

    /// Remove a block. Only the owning provider may do so.
    pub async fn unblock(
        &self,
        block_id: Uuid,
        requesting_provider_id: Uuid,
    ) -> Result<(), SchedulingError> {
        let (_, schedule) = self
            .store
            .schedule_of_block(block_id)
            .await
            .ok_or(SchedulingError::NotFound)?;
        let mut schedule = schedule.lock().await;

        let block = schedule
            .blocked
            .get(&block_id)
            .ok_or(SchedulingError::NotFound)?;

        if block.provider_id != requesting_provider_id {
            warn!(
                "Provider {} tried to unblock {} owned by {}",
                requesting_provider_id, block_id, block.provider_id
            );
            return Err(SchedulingError::Forbidden);
        }

        schedule.blocked.remove(&block_id);
        drop(schedule);
        self.store.forget_block(block_id).await;

        info!("Provider {} removed block {}", requesting_provider_id, block_id);
        Ok(())
    }

    /// Blocks for a provider in a date range, date ascending.
    pub async fn list_blocked(&self, provider_id: Uuid, range: DateRange) -> Vec<BlockedInterval> {
        let schedule = self.store.schedule_for(provider_id).await;
        let schedule = schedule.lock().await;
        schedule.blocks_in_range(&range)
    }
}
