//! Query functions for groups.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::{event, group};
use crate::model::group::GroupRow;

/// ## Summary
/// Returns a query to select all groups.
#[must_use]
pub fn all() -> group::BoxedQuery<'static, diesel::pg::Pg> {
    group::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a group by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> group::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(group::id.eq(id))
}

/// ## Summary
/// Loads a group by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<GroupRow>> {
    by_id(id)
        .select(GroupRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads groups that have a schedule but no generated event starting at or
/// after `now`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_idle_scheduled(
    conn: &mut DbConnection<'_>,
    now: DateTime<Utc>,
) -> QueryResult<Vec<GroupRow>> {
    let covered = event::table
        .filter(event::is_override.eq(false))
        .filter(event::starts_at.ge(now))
        .select(event::group_id);

    group::table
        .filter(group::schedule.is_not_null())
        .filter(group::id.ne_all(covered))
        .order(group::id.asc())
        .select(GroupRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Inserts a group or replaces every field of an existing one.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn upsert(conn: &mut DbConnection<'_>, row: &GroupRow) -> QueryResult<usize> {
    diesel::insert_into(group::table)
        .values(row)
        .on_conflict(group::id)
        .do_update()
        .set((
            group::name.eq(excluded(group::name)),
            group::owner_id.eq(excluded(group::owner_id)),
            group::members.eq(excluded(group::members)),
            group::moderators.eq(excluded(group::moderators)),
            group::schedule.eq(excluded(group::schedule)),
            group::time.eq(excluded(group::time)),
            group::timezone.eq(excluded(group::timezone)),
            group::default_capacity.eq(excluded(group::default_capacity)),
            group::default_location.eq(excluded(group::default_location)),
            group::updated_at.eq(excluded(group::updated_at)),
        ))
        .execute(conn)
        .await
}
