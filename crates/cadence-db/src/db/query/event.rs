//! Query functions for events.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::connection::DbConnection;
use crate::db::schema::event;
use crate::model::event::EventRow;

/// ## Summary
/// Returns a query to select all events.
#[must_use]
pub fn all() -> event::BoxedQuery<'static, diesel::pg::Pg> {
    event::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an event by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event::id.eq(id))
}

/// ## Summary
/// Returns a query to find generated (non-override) events.
#[must_use]
pub fn generated() -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event::is_override.eq(false))
}

/// ## Summary
/// Loads an event by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<EventRow>> {
    by_id(id)
        .select(EventRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads generated events that started strictly before `now`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_expired_generated(
    conn: &mut DbConnection<'_>,
    now: DateTime<Utc>,
) -> QueryResult<Vec<EventRow>> {
    generated()
        .filter(event::starts_at.lt(now))
        .order(event::starts_at.asc())
        .select(EventRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Deletes the generated events among `ids`. Override events are never touched.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn delete_generated(conn: &mut DbConnection<'_>, ids: &[uuid::Uuid]) -> QueryResult<usize> {
    diesel::delete(
        event::table
            .filter(event::id.eq_any(ids))
            .filter(event::is_override.eq(false)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes generated events of one group that started before `now`.
///
/// Takes a bare connection so it can run inside a transaction.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn delete_expired_generated_for_group(
    conn: &mut AsyncPgConnection,
    group_id: uuid::Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::delete(
        event::table
            .filter(event::group_id.eq(group_id))
            .filter(event::is_override.eq(false))
            .filter(event::starts_at.lt(now)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Whether the group has a generated event, expired or not.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn has_generated(conn: &mut AsyncPgConnection, group_id: uuid::Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        generated().filter(event::group_id.eq(group_id)),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Whether any event of the group claims the recurrence slot starting at `slot`.
///
/// Cancelled and edited events keep the slot they were generated for.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn slot_claimed(
    conn: &mut AsyncPgConnection,
    group_id: uuid::Uuid,
    slot: DateTime<Utc>,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        event::table
            .filter(event::group_id.eq(group_id))
            .filter(event::slot_starts_at.eq(slot)),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Inserts an event unless it collides with a unique index.
///
/// The partial unique indexes on `group_id` and on `(group_id, slot_starts_at)`
/// turn a racing second insert into a no-op, which is reported as `None`.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn insert_or_ignore(
    conn: &mut AsyncPgConnection,
    row: &EventRow,
) -> QueryResult<Option<EventRow>> {
    diesel::insert_into(event::table)
        .values(row)
        .on_conflict_do_nothing()
        .returning(EventRow::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Inserts an event.
///
/// ## Errors
/// Returns a database error if the statement fails, including unique violations.
pub async fn insert(conn: &mut DbConnection<'_>, row: &EventRow) -> QueryResult<EventRow> {
    diesel::insert_into(event::table)
        .values(row)
        .returning(EventRow::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Overwrites an event if its stored version still equals `expected_version`.
///
/// `row.version` must already hold the new version. Returns the stored row,
/// or `None` if another writer got there first.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn update_if_version(
    conn: &mut DbConnection<'_>,
    row: &EventRow,
    expected_version: i64,
) -> QueryResult<Option<EventRow>> {
    diesel::update(
        event::table
            .filter(event::id.eq(row.id))
            .filter(event::version.eq(expected_version)),
    )
    .set(row)
    .returning(EventRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Loads events of a group starting at or after `now`, soonest first.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_upcoming_for_group(
    conn: &mut DbConnection<'_>,
    group_id: uuid::Uuid,
    now: DateTime<Utc>,
) -> QueryResult<Vec<EventRow>> {
    all()
        .filter(event::group_id.eq(group_id))
        .filter(event::starts_at.ge(now))
        .order(event::starts_at.asc())
        .select(EventRow::as_select())
        .load(conn)
        .await
}
