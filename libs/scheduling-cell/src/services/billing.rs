// libs/scheduling-cell/src/services/billing.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{AppointmentStatus, Bill, BillStatus, SchedulingError};
use crate::store::ScheduleStore;

/// Billing unlocks only once an appointment reaches COMPLETED.
pub struct BillingService {
    store: Arc<ScheduleStore>,
}

impl BillingService {
    pub fn new(store: Arc<ScheduleStore>) -> Self {
        Self { store }
    }

    /// Idempotent upsert: at most one Bill per appointment. A repeat
    /// request updates amount and description in place instead of
    /// creating a duplicate.
    pub async fn generate_bill(
        &self,
        appointment_id: Uuid,
        amount: f64,
        description: String,
    ) -> Result<Bill, SchedulingError> {
        let (_, schedule) = self
            .store
            .schedule_of_appointment(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;

        {
            let schedule = schedule.lock().await;
            let appointment = schedule
                .appointments
                .get(&appointment_id)
                .ok_or(SchedulingError::NotFound)?;
            if appointment.status != AppointmentStatus::Completed {
                return Err(SchedulingError::NotEligible);
            }
        }

        let now = Utc::now();
        let bill = match self.store.get_bill(appointment_id).await {
            Some(existing) => Bill {
                amount,
                description,
                updated_at: now,
                ..existing
            },
            None => Bill {
                appointment_id,
                amount,
                description,
                status: BillStatus::Issued,
                created_at: now,
                updated_at: now,
            },
        };
        self.store.put_bill(bill.clone()).await;

        info!(
            "Bill for appointment {} upserted (amount {:.2})",
            appointment_id, bill.amount
        );
        Ok(bill)
    }

    pub async fn get_bill(&self, appointment_id: Uuid) -> Result<Bill, SchedulingError> {
        self.store
            .get_bill(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)
    }
}
