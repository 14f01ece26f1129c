//! Side-effect data emitted for an external notifier.

use std::sync::Mutex;

use cadence_core::types::{EventId, GroupId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A seat opened and the head of the waitlist moved to `in`.
    WaitlistPromoted {
        group: GroupId,
        event: EventId,
        user: UserId,
    },
    /// A new meeting instance exists.
    EventScheduled {
        group: GroupId,
        event: EventId,
        date: NaiveDate,
        starts_at: DateTime<Utc>,
    },
}

/// Receives notifications after the write that caused them has been stored.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes each notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::WaitlistPromoted { group, event, user } => {
                tracing::info!(%group, %event, %user, "User promoted from waitlist");
            }
            Notification::EventScheduled {
                group,
                event,
                date,
                starts_at,
            } => {
                tracing::info!(%group, %event, %date, %starts_at, "Event scheduled");
            }
        }
    }
}

/// Keeps every notification in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Returns and clears everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|mut received| std::mem::take(&mut *received))
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        match self.received.lock() {
            Ok(mut received) => received.push(notification),
            Err(_poisoned) => tracing::error!("Notification recorder lock poisoned"),
        }
    }
}
