//! RSVP transitions.
//!
//! [`transition`] is the pure state machine over one roster. [`submit`] runs
//! it against the store with optimistic retries and emits promotion
//! notifications once the write is stored.

use std::fmt;
use std::str::FromStr;

use cadence_core::types::{EventId, RsvpStatus, UserId};
use cadence_db::{Event, Roster};
use serde::{Deserialize, Serialize};

use crate::capacity;
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Notification;
use crate::update::modify_event;

/// The statuses a user may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpRequest {
    In,
    Out,
}

impl FromStr for RsvpRequest {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(ServiceError::InvalidRequest(format!(
                "status must be \"in\" or \"out\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for RsvpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "in",
            Self::Out => "out",
        })
    }
}

/// What one transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpOutcome {
    /// Where the requesting user ended up.
    pub status: RsvpStatus,
    /// Waitlisted users moved into `in` by the seat this transition freed.
    pub promoted: Vec<UserId>,
}

/// ## Summary
/// Applies `requested` for `user` to `roster` under `capacity`.
///
/// `out` always lands in `out`. `in` lands in `in` if a seat is free, else at
/// the tail of the waitlist. Leaving `in` promotes from the waitlist.
/// Repeating the current status changes nothing, and a waitlisted user asking
/// for `in` again keeps their place in line.
///
/// ## Errors
/// Returns `ServiceError::Forbidden` if `user` is not on the event's roster.
pub fn transition(
    roster: &mut Roster,
    capacity: u32,
    user: UserId,
    requested: RsvpRequest,
) -> ServiceResult<RsvpOutcome> {
    if !roster.members.contains(&user) {
        return Err(ServiceError::Forbidden(format!(
            "user {user} is not a member of this event"
        )));
    }

    let current = roster.status_of(user);
    let unchanged = match (current, requested) {
        (Some(RsvpStatus::In), RsvpRequest::In) | (Some(RsvpStatus::Out), RsvpRequest::Out) => {
            true
        }
        (Some(RsvpStatus::Waitlist), RsvpRequest::In) => {
            !capacity::has_open_seat(roster, capacity)
        }
        _ => false,
    };
    if unchanged && let Some(status) = current {
        return Ok(RsvpOutcome {
            status,
            promoted: Vec::new(),
        });
    }

    let previous = roster.take(user);
    let status = match requested {
        RsvpRequest::Out => RsvpStatus::Out,
        RsvpRequest::In if capacity::has_open_seat(roster, capacity) => RsvpStatus::In,
        RsvpRequest::In => RsvpStatus::Waitlist,
    };
    roster.place(user, status);

    let promoted = if previous == Some(RsvpStatus::In) {
        capacity::fill_open_seats(roster, capacity)
    } else {
        Vec::new()
    };

    Ok(RsvpOutcome { status, promoted })
}

/// ## Summary
/// Records `user`'s RSVP on an event.
///
/// ## Side Effects
/// Writes the event's roster and emits `WaitlistPromoted` for every user
/// moved off the waitlist.
///
/// ## Errors
/// - `NotFound` if the event does not exist
/// - `InvalidRequest` if the event is cancelled
/// - `Forbidden` if the user is not on the event's roster
/// - `ConcurrencyConflict` if the event kept changing underneath the write
#[tracing::instrument(skip_all, fields(%event_id, %user, %requested))]
pub async fn submit(
    ctx: &ServiceContext,
    event_id: EventId,
    user: UserId,
    requested: RsvpRequest,
) -> ServiceResult<Event> {
    let (event, outcome) = modify_event(ctx.store.as_ref(), event_id, ctx.max_retries, |event| {
        if event.is_cancelled() {
            return Err(ServiceError::InvalidRequest(format!(
                "event {} is cancelled",
                event.id
            )));
        }
        transition(&mut event.roster, event.capacity, user, requested)
    })
    .await?;

    tracing::debug!(status = %outcome.status, promoted = outcome.promoted.len(), "RSVP recorded");

    for promoted in outcome.promoted {
        ctx.notifier.notify(Notification::WaitlistPromoted {
            group: event.group_id,
            event: event.id,
            user: promoted,
        });
    }

    Ok(event)
}
