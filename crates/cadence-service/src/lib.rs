//! The scheduling engine: regeneration, RSVP handling and roster upkeep.
//!
//! Operations take a [`ServiceContext`] and an explicit `now` where time
//! matters; nothing here reads the system clock.

pub mod capacity;
pub mod context;
pub mod error;
pub mod events;
pub mod notify;
pub mod regeneration;
pub mod roster;
pub mod rsvp;
pub mod update;

pub use context::ServiceContext;
pub use error::{ServiceError, ServiceResult};
pub use notify::{Notification, NotificationSink, RecordingSink, TracingSink};
pub use regeneration::{EventRegenerationJob, GroupFailure, RegenerationReport};
pub use rsvp::{RsvpOutcome, RsvpRequest};
