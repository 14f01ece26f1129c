//! Capacity enforcement and waitlist promotion.
//!
//! The waitlist is first-in first-out: its order is the order users joined it.

use cadence_core::types::{RsvpStatus, UserId};
use cadence_db::Roster;

/// Seats still free on an event, or `None` when capacity is unlimited (0).
#[must_use]
pub fn open_seats(roster: &Roster, capacity: u32) -> Option<usize> {
    if capacity == 0 {
        return None;
    }
    let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
    Some(capacity.saturating_sub(roster.attending.len()))
}

#[must_use]
pub fn has_open_seat(roster: &Roster, capacity: u32) -> bool {
    open_seats(roster, capacity).is_none_or(|seats| seats > 0)
}

/// ## Summary
/// Moves waitlisted users into `in`, earliest first, until no seat is free.
///
/// Returns the promoted users in promotion order.
pub fn fill_open_seats(roster: &mut Roster, capacity: u32) -> Vec<UserId> {
    let mut promoted = Vec::new();
    while has_open_seat(roster, capacity) && !roster.waitlist.is_empty() {
        let user = roster.waitlist.remove(0);
        roster.place(user, RsvpStatus::In);
        promoted.push(user);
    }
    promoted
}
