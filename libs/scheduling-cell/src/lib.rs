pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

use std::sync::Arc;

use models::ClinicHours;
use services::availability::AvailabilityService;
use services::billing::BillingService;
use services::blocking::BlockingService;
use services::booking::BookingService;
use services::directory::ProviderDirectory;
use services::notify::{NotificationService, NotificationSink};
use store::ScheduleStore;

/// The scheduling engine with all services wired over one shared store.
/// Held as shared state by the API binding.
pub struct SchedulingCell {
    pub availability: AvailabilityService,
    pub blocking: BlockingService,
    pub booking: BookingService,
    pub billing: BillingService,
    pub notifications: NotificationService,
}

impl SchedulingCell {
    pub fn new(
        hours: ClinicHours,
        directory: Arc<dyn ProviderDirectory>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let store = Arc::new(ScheduleStore::new());

        Self {
            availability: AvailabilityService::new(Arc::clone(&store)),
            blocking: BlockingService::new(Arc::clone(&store)),
            booking: BookingService::new(Arc::clone(&store), directory, sink, hours),
            billing: BillingService::new(Arc::clone(&store)),
            notifications: NotificationService::new(store),
        }
    }
}
