//! Manual event management: one-off events, edits and cancellation.
//!
//! Every event touched here becomes an override, so the regeneration job
//! neither deletes nor duplicates it.

use cadence_core::types::{EventId, GroupId, UserId};
use cadence_db::{Event, EventStatus, NewEvent, Roster};
use cadence_rule::{ClockTime, start_instant, zone};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::capacity;
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Notification;
use crate::update::modify_event;

/// Fields for a one-off event. Missing fields fall back to the group defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OneOffEvent {
    pub date: NaiveDate,
    pub time: ClockTime,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields to change on an existing event; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<ClockTime>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub status: Option<EventStatus>,
}

/// ## Summary
/// Creates an override event for a group outside its schedule.
///
/// ## Side Effects
/// Inserts the event and emits `EventScheduled`.
///
/// ## Errors
/// - `NotFound` if the group does not exist
/// - `InvalidRequest` if no timezone is given and the group has none
/// - `InvalidRule` if the timezone is unknown or the time cannot be placed
#[tracing::instrument(skip(ctx, details), fields(date = %details.date))]
pub async fn create_one_off_event(
    ctx: &ServiceContext,
    group_id: GroupId,
    details: OneOffEvent,
) -> ServiceResult<Event> {
    let group = ctx
        .store
        .get_group(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group {group_id}")))?;

    let timezone = details
        .timezone
        .or_else(|| group.timezone.clone())
        .ok_or_else(|| ServiceError::InvalidRequest("a timezone is required".to_string()))?;
    let tz = zone::resolve(&timezone)?;
    let starts_at = start_instant(details.date, details.time, tz)?;

    let event = ctx
        .store
        .insert_event(NewEvent {
            group_id,
            name: details.name.unwrap_or_else(|| group.name.clone()),
            date: details.date,
            time: details.time,
            timezone: tz.name().to_string(),
            starts_at,
            location: details.location.or_else(|| group.default_location.clone()),
            status: EventStatus::Scheduled,
            is_override: true,
            capacity: details.capacity.unwrap_or(group.default_capacity),
            roster: Roster::seeded(group.entitled_users()),
        })
        .await?;

    tracing::info!(event_id = %event.id, "One-off event created");
    ctx.notifier.notify(Notification::EventScheduled {
        group: group_id,
        event: event.id,
        date: event.date,
        starts_at: event.starts_at,
    });
    Ok(event)
}

fn apply_patch(event: &mut Event, patch: &EventPatch) -> ServiceResult<Vec<UserId>> {
    if let Some(name) = &patch.name {
        event.name.clone_from(name);
    }
    if let Some(location) = &patch.location {
        event.location = Some(location.clone());
    }
    if let Some(status) = patch.status {
        event.status = status;
    }

    if patch.date.is_some() || patch.time.is_some() || patch.timezone.is_some() {
        let date = patch.date.unwrap_or(event.date);
        let time = patch.time.unwrap_or(event.time);
        let tz = zone::resolve(patch.timezone.as_deref().unwrap_or(&event.timezone))?;
        event.starts_at = start_instant(date, time, tz)?;
        event.date = date;
        event.time = time;
        event.timezone = tz.name().to_string();
    }

    let mut promoted = Vec::new();
    if let Some(new_capacity) = patch.capacity {
        let attending = event.roster.attending.len();
        if new_capacity != 0 && usize::try_from(new_capacity).unwrap_or(usize::MAX) < attending {
            return Err(ServiceError::InvalidRequest(format!(
                "capacity {new_capacity} is below the {attending} users already attending"
            )));
        }
        event.capacity = new_capacity;
        promoted = capacity::fill_open_seats(&mut event.roster, new_capacity);
    }

    event.is_override = true;
    Ok(promoted)
}

/// ## Summary
/// Edits an event and marks it as an override.
///
/// Raising the capacity moves waitlisted users into the new seats in the
/// order they joined. Lowering it below the current attendance is rejected.
///
/// ## Side Effects
/// Writes the event and emits `WaitlistPromoted` for each promoted user.
///
/// ## Errors
/// - `NotFound` if the event does not exist
/// - `InvalidRequest` if the capacity is too low
/// - `InvalidRule` if the new timezone or time is invalid
/// - `ConcurrencyConflict` if the event kept changing underneath the write
#[tracing::instrument(skip(ctx, patch))]
pub async fn override_event(
    ctx: &ServiceContext,
    event_id: EventId,
    patch: EventPatch,
) -> ServiceResult<Event> {
    let (event, promoted) = modify_event(ctx.store.as_ref(), event_id, ctx.max_retries, |event| {
        apply_patch(event, &patch)
    })
    .await?;

    for user in promoted {
        ctx.notifier.notify(Notification::WaitlistPromoted {
            group: event.group_id,
            event: event.id,
            user,
        });
    }
    Ok(event)
}

/// ## Summary
/// Cancels an event. Cancelling twice is a no-op.
///
/// ## Errors
/// - `NotFound` if the event does not exist
/// - `ConcurrencyConflict` if the event kept changing underneath the write
#[tracing::instrument(skip(ctx))]
pub async fn cancel_event(ctx: &ServiceContext, event_id: EventId) -> ServiceResult<Event> {
    let (event, ()) = modify_event(ctx.store.as_ref(), event_id, ctx.max_retries, |event| {
        event.status = EventStatus::Cancelled;
        event.is_override = true;
        Ok(())
    })
    .await?;

    tracing::info!(group_id = %event.group_id, "Event cancelled");
    Ok(event)
}
