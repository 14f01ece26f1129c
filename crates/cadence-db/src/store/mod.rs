//! The storage contract the scheduling engine is written against.

use async_trait::async_trait;
use cadence_core::types::{EventId, GroupId};
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::model::event::{Event, NewEvent};
use crate::model::group::Group;

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;

/// Result of an atomic create-if-absent of a generated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(Box<Event>),
    /// The group already has a generated event; nothing was written.
    AlreadyPresent,
    /// The slot belongs to an event that was cancelled or edited after it was
    /// generated; nothing was written.
    SlotClaimed,
}

/// Group and event persistence.
///
/// Implementations must make `insert_generated_event_if_absent` and
/// `update_event_if_version` atomic: the first guarantees at most one
/// generated event per group, the second that roster writes never interleave.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_group(&self, id: GroupId) -> DbResult<Option<Group>>;

    /// Inserts the group or replaces the stored copy.
    async fn save_group(&self, group: &Group) -> DbResult<()>;

    /// Groups with a schedule and no generated event starting at or after `now`.
    async fn list_idle_scheduled_groups(&self, now: DateTime<Utc>) -> DbResult<Vec<Group>>;

    async fn get_event(&self, id: EventId) -> DbResult<Option<Event>>;

    /// Generated events whose start instant is strictly before `now`.
    async fn list_expired_generated_events(&self, now: DateTime<Utc>) -> DbResult<Vec<Event>>;

    /// Deletes the given events, skipping any that are overrides. Returns the
    /// number of rows removed.
    async fn delete_generated_events(&self, ids: &[EventId]) -> DbResult<usize>;

    /// Atomically stores `event` unless its group already has a generated
    /// event or another event of the group still claims the slot starting at
    /// `event.starts_at`. The stored event claims that slot. Stale generated
    /// events of the group (started before `now`) are cleared in the same unit
    /// so they cannot block the insert.
    async fn insert_generated_event_if_absent(
        &self,
        event: NewEvent,
        now: DateTime<Utc>,
    ) -> DbResult<InsertOutcome>;

    /// Stores an override event unconditionally.
    async fn insert_event(&self, event: NewEvent) -> DbResult<Event>;

    /// Writes `event` with `expected_version + 1` if the stored version is
    /// still `expected_version`. Returns the stored event, or `None` when a
    /// concurrent write won.
    async fn update_event_if_version(
        &self,
        event: &Event,
        expected_version: i64,
    ) -> DbResult<Option<Event>>;

    /// Events of a group starting at or after `now`, soonest first.
    async fn list_upcoming_events_for_group(
        &self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Event>>;
}
