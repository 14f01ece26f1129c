use std::sync::Arc;

use cadence_db::ScheduleStore;

use crate::notify::{NotificationSink, TracingSink};

/// Default number of re-reads after a lost optimistic write.
pub const DEFAULT_MAX_RETRIES: u8 = 5;

/// Handles shared by every engine operation.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn ScheduleStore>,
    pub notifier: Arc<dyn NotificationSink>,
    /// Re-reads allowed after a concurrent writer bumps an event's version.
    pub max_retries: u8,
}

impl ServiceContext {
    #[must_use]
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            store,
            notifier: Arc::new(TracingSink),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }
}
