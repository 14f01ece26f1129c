//! In-process [`ScheduleStore`] backed by hash maps.
//!
//! Each write takes the relevant lock for its whole read-modify-write, which
//! gives the same atomicity the `PostgreSQL` store gets from its unique index
//! and version predicate.

use std::collections::HashMap;

use async_trait::async_trait;
use cadence_core::types::{EventId, GroupId};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::DbResult;
use crate::model::event::{Event, NewEvent};
use crate::model::group::Group;
use crate::store::{InsertOutcome, ScheduleStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: RwLock<HashMap<GroupId, Group>>,
    events: RwLock<HashMap<EventId, Event>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Every stored event of `group_id`, past ones included, oldest first.
    pub async fn events_for_group(&self, group_id: GroupId) -> Vec<Event> {
        let events = self.events.read().await;
        let mut found: Vec<Event> = events
            .values()
            .filter(|event| event.group_id == group_id)
            .cloned()
            .collect();
        found.sort_by_key(|event| (event.starts_at, event.id));
        found
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get_group(&self, id: GroupId) -> DbResult<Option<Group>> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn save_group(&self, group: &Group) -> DbResult<()> {
        self.groups.write().await.insert(group.id, group.clone());
        Ok(())
    }

    async fn list_idle_scheduled_groups(&self, now: DateTime<Utc>) -> DbResult<Vec<Group>> {
        let groups = self.groups.read().await;
        let events = self.events.read().await;

        let mut idle: Vec<Group> = groups
            .values()
            .filter(|group| group.has_schedule())
            .filter(|group| {
                !events.values().any(|event| {
                    event.group_id == group.id && !event.is_override && event.starts_at >= now
                })
            })
            .cloned()
            .collect();
        idle.sort_by_key(|group| group.id);
        Ok(idle)
    }

    async fn get_event(&self, id: EventId) -> DbResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list_expired_generated_events(&self, now: DateTime<Utc>) -> DbResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut expired: Vec<Event> = events
            .values()
            .filter(|event| !event.is_override && event.has_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|event| (event.starts_at, event.id));
        Ok(expired)
    }

    async fn delete_generated_events(&self, ids: &[EventId]) -> DbResult<usize> {
        let mut events = self.events.write().await;
        let mut deleted = 0;
        for id in ids {
            if events.get(id).is_some_and(|event| !event.is_override) {
                events.remove(id);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn insert_generated_event_if_absent(
        &self,
        event: NewEvent,
        now: DateTime<Utc>,
    ) -> DbResult<InsertOutcome> {
        let mut events = self.events.write().await;

        events.retain(|_, existing| {
            existing.group_id != event.group_id
                || existing.is_override
                || !existing.has_expired(now)
        });

        let present = events
            .values()
            .any(|existing| existing.group_id == event.group_id && !existing.is_override);
        if present {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        let claimed = events.values().any(|existing| {
            existing.group_id == event.group_id && existing.slot_starts_at == Some(event.starts_at)
        });
        if claimed {
            return Ok(InsertOutcome::SlotClaimed);
        }

        let mut stored = event.into_event(uuid::Uuid::now_v7(), Utc::now());
        stored.slot_starts_at = Some(stored.starts_at);
        events.insert(stored.id, stored.clone());
        Ok(InsertOutcome::Created(Box::new(stored)))
    }

    async fn insert_event(&self, event: NewEvent) -> DbResult<Event> {
        let stored = event.into_event(uuid::Uuid::now_v7(), Utc::now());
        self.events.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_event_if_version(
        &self,
        event: &Event,
        expected_version: i64,
    ) -> DbResult<Option<Event>> {
        let mut events = self.events.write().await;
        match events.get_mut(&event.id) {
            Some(current) if current.version == expected_version => {
                let mut updated = event.clone();
                updated.version = expected_version + 1;
                updated.created_at = current.created_at;
                *current = updated.clone();
                Ok(Some(updated))
            }
            _ => Ok(None),
        }
    }

    async fn list_upcoming_events_for_group(
        &self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut upcoming: Vec<Event> = events
            .values()
            .filter(|event| event.group_id == group_id && !event.has_expired(now))
            .cloned()
            .collect();
        upcoming.sort_by_key(|event| (event.starts_at, event.id));
        Ok(upcoming)
    }
}
