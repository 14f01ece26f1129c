//! `PostgreSQL` implementation of [`ScheduleStore`].

use async_trait::async_trait;
use cadence_core::types::{EventId, GroupId};
use chrono::{DateTime, Utc};
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;

use crate::db::DbProvider;
use crate::db::connection::DbPool;
use crate::db::query;
use crate::error::{DbError, DbResult};
use crate::model::event::{Event, EventRow, NewEvent};
use crate::model::group::{Group, GroupRow};
use crate::store::{InsertOutcome, ScheduleStore};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_events(rows: Vec<EventRow>) -> DbResult<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

#[async_trait]
impl ScheduleStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn get_group(&self, id: GroupId) -> DbResult<Option<Group>> {
        let mut conn = self.pool.get_connection().await?;
        query::group::find(&mut conn, id)
            .await?
            .map(Group::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self, group), fields(group_id = %group.id))]
    async fn save_group(&self, group: &Group) -> DbResult<()> {
        let row = GroupRow::from_group(group, Utc::now())?;
        let mut conn = self.pool.get_connection().await?;
        query::group::upsert(&mut conn, &row).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_idle_scheduled_groups(&self, now: DateTime<Utc>) -> DbResult<Vec<Group>> {
        let mut conn = self.pool.get_connection().await?;
        let rows = query::group::list_idle_scheduled(&mut conn, now).await?;
        tracing::debug!(count = rows.len(), "Loaded idle scheduled groups");
        rows.into_iter().map(Group::try_from).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn get_event(&self, id: EventId) -> DbResult<Option<Event>> {
        let mut conn = self.pool.get_connection().await?;
        query::event::find(&mut conn, id)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_expired_generated_events(&self, now: DateTime<Utc>) -> DbResult<Vec<Event>> {
        let mut conn = self.pool.get_connection().await?;
        decode_events(query::event::list_expired_generated(&mut conn, now).await?)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_generated_events(&self, ids: &[EventId]) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::delete_generated(&mut conn, ids).await?)
    }

    #[tracing::instrument(skip(self, event), fields(group_id = %event.group_id, date = %event.date))]
    async fn insert_generated_event_if_absent(
        &self,
        event: NewEvent,
        now: DateTime<Utc>,
    ) -> DbResult<InsertOutcome> {
        let group_id = event.group_id;
        let mut event = event.into_event(uuid::Uuid::now_v7(), Utc::now());
        event.slot_starts_at = Some(event.starts_at);
        let slot = event.starts_at;
        let row = EventRow::from_event(&event, event.created_at)?;

        let mut conn = self.pool.get_connection().await?;
        conn.transaction::<_, DbError, _>(|tx| {
            async move {
                let cleared =
                    query::event::delete_expired_generated_for_group(tx, group_id, now).await?;
                if cleared > 0 {
                    tracing::debug!(cleared, "Cleared stale generated events");
                }

                if query::event::has_generated(tx, group_id).await? {
                    return Ok(InsertOutcome::AlreadyPresent);
                }
                if query::event::slot_claimed(tx, group_id, slot).await? {
                    return Ok(InsertOutcome::SlotClaimed);
                }

                match query::event::insert_or_ignore(tx, &row).await? {
                    Some(row) => Ok(InsertOutcome::Created(Box::new(Event::try_from(row)?))),
                    // Lost the race to a concurrent insert for this group
                    None => Ok(InsertOutcome::AlreadyPresent),
                }
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, event), fields(group_id = %event.group_id, date = %event.date))]
    async fn insert_event(&self, event: NewEvent) -> DbResult<Event> {
        let event = event.into_event(uuid::Uuid::now_v7(), Utc::now());
        let row = EventRow::from_event(&event, event.created_at)?;
        let mut conn = self.pool.get_connection().await?;
        Event::try_from(query::event::insert(&mut conn, &row).await?)
    }

    #[tracing::instrument(skip(self, event), fields(event_id = %event.id))]
    async fn update_event_if_version(
        &self,
        event: &Event,
        expected_version: i64,
    ) -> DbResult<Option<Event>> {
        let mut row = EventRow::from_event(event, Utc::now())?;
        row.version = expected_version + 1;

        let mut conn = self.pool.get_connection().await?;
        query::event::update_if_version(&mut conn, &row, expected_version)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_upcoming_events_for_group(
        &self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Event>> {
        let mut conn = self.pool.get_connection().await?;
        decode_events(query::event::list_upcoming_for_group(&mut conn, group_id, now).await?)
    }
}
