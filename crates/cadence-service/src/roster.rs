//! Keeps upcoming event rosters in step with group membership.

use cadence_core::types::{GroupId, RsvpStatus, UserId};
use cadence_db::Group;
use chrono::{DateTime, Utc};

use crate::capacity;
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Notification;
use crate::update::modify_event;

async fn load_group(ctx: &ServiceContext, group_id: GroupId) -> ServiceResult<Group> {
    ctx.store
        .get_group(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group {group_id}")))
}

/// ## Summary
/// Adds `user` to a group and, as undecided, to every upcoming event of it.
///
/// Returns the number of events whose roster changed. Adding an existing
/// member changes nothing.
///
/// ## Errors
/// Returns `NotFound` if the group does not exist, or a store or
/// `ConcurrencyConflict` error from updating an event.
#[tracing::instrument(skip(ctx))]
pub async fn add_member(
    ctx: &ServiceContext,
    group_id: GroupId,
    user: UserId,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    let mut group = load_group(ctx, group_id).await?;
    if !group.is_member(user) {
        group.members.push(user);
        ctx.store.save_group(&group).await?;
    }

    let mut changed = 0;
    for event in ctx.store.list_upcoming_events_for_group(group_id, now).await? {
        let (_, added) = modify_event(ctx.store.as_ref(), event.id, ctx.max_retries, |event| {
            if event.roster.members.contains(&user) {
                return Ok(false);
            }
            event.roster.members.push(user);
            event.roster.place(user, RsvpStatus::Undecided);
            Ok(true)
        })
        .await?;
        changed += usize::from(added);
    }

    tracing::debug!(changed, "Member added to upcoming events");
    Ok(changed)
}

/// ## Summary
/// Removes `user` from a group and from every upcoming event of it.
///
/// Seats the user held are handed to the waitlist in join order.
///
/// ## Side Effects
/// Emits `WaitlistPromoted` for each promoted user.
///
/// ## Errors
/// Returns `NotFound` if the group does not exist, `InvalidRequest` if `user`
/// owns the group, or a store or `ConcurrencyConflict` error from updating an
/// event.
#[tracing::instrument(skip(ctx))]
pub async fn remove_member(
    ctx: &ServiceContext,
    group_id: GroupId,
    user: UserId,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    let mut group = load_group(ctx, group_id).await?;
    if group.owner == user {
        return Err(ServiceError::InvalidRequest(
            "the owner cannot be removed from their group".to_string(),
        ));
    }
    if group.members.contains(&user) || group.moderators.contains(&user) {
        group.members.retain(|member| *member != user);
        group.moderators.retain(|moderator| *moderator != user);
        ctx.store.save_group(&group).await?;
    }

    let mut changed = 0;
    for event in ctx.store.list_upcoming_events_for_group(group_id, now).await? {
        let (event, promoted) =
            modify_event(ctx.store.as_ref(), event.id, ctx.max_retries, |event| {
                if !event.roster.members.contains(&user) {
                    return Ok(None);
                }
                event.roster.members.retain(|member| *member != user);
                let promoted = if event.roster.take(user) == Some(RsvpStatus::In) {
                    capacity::fill_open_seats(&mut event.roster, event.capacity)
                } else {
                    Vec::new()
                };
                Ok(Some(promoted))
            })
            .await?;

        let Some(promoted) = promoted else {
            continue;
        };
        changed += 1;
        for promoted_user in promoted {
            ctx.notifier.notify(Notification::WaitlistPromoted {
                group: group_id,
                event: event.id,
                user: promoted_user,
            });
        }
    }

    tracing::debug!(changed, "Member removed from upcoming events");
    Ok(changed)
}
