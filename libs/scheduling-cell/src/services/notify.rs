// libs/scheduling-cell/src/services/notify.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::models::{Notification, NotificationKind, SchedulingError};
use crate::store::ScheduleStore;

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound delivery channel (email, push, ...). Delivery failures are
/// logged by the caller and never fail the triggering transition.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        payload: &str,
    ) -> Result<(), DeliveryError>;
}

/// Sink that only writes to the log. Default wiring for the API binding.
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        payload: &str,
    ) -> Result<(), DeliveryError> {
        info!("Notifying {} of {}: {}", recipient_id, kind, payload);
        Ok(())
    }
}

/// Recipient-facing notification mailbox. Read/unread is the only
/// mutable field after creation.
pub struct NotificationService {
    store: Arc<ScheduleStore>,
}

impl NotificationService {
    pub fn new(store: Arc<ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn list_for_recipient(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.store.notifications_for(recipient_id).await
    }

    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Notification, SchedulingError> {
        let notification = self
            .store
            .find_notification(notification_id)
            .await
            .ok_or(SchedulingError::NotFound)?;

        if notification.recipient_id != recipient_id {
            return Err(SchedulingError::Forbidden);
        }

        self.store
            .mark_notification_read(notification_id)
            .await
            .ok_or(SchedulingError::NotFound)
    }
}
