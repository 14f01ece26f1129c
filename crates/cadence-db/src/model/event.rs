use cadence_core::types::{EventId, GroupId, RsvpStatus, UserId};
use cadence_rule::ClockTime;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;
use crate::error::{DbError, DbResult};

pub use crate::db::enums::EventStatus;

/// Attendance buckets of one event.
///
/// `members` lists everyone entitled to RSVP. Each member sits in exactly one
/// of the four status buckets; `waitlist` is ordered by join time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub members: Vec<UserId>,
    pub undecided: Vec<UserId>,
    #[serde(rename = "in")]
    pub attending: Vec<UserId>,
    #[serde(rename = "out")]
    pub declined: Vec<UserId>,
    pub waitlist: Vec<UserId>,
}

impl Roster {
    /// ## Summary
    /// A fresh roster where every member is undecided.
    #[must_use]
    pub fn seeded(members: Vec<UserId>) -> Self {
        Self {
            undecided: members.clone(),
            members,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status_of(&self, user: UserId) -> Option<RsvpStatus> {
        [
            RsvpStatus::Undecided,
            RsvpStatus::In,
            RsvpStatus::Out,
            RsvpStatus::Waitlist,
        ]
        .into_iter()
        .find(|status| self.bucket(*status).contains(&user))
    }

    #[must_use]
    pub fn bucket(&self, status: RsvpStatus) -> &[UserId] {
        match status {
            RsvpStatus::Undecided => &self.undecided,
            RsvpStatus::In => &self.attending,
            RsvpStatus::Out => &self.declined,
            RsvpStatus::Waitlist => &self.waitlist,
        }
    }

    fn bucket_mut(&mut self, status: RsvpStatus) -> &mut Vec<UserId> {
        match status {
            RsvpStatus::Undecided => &mut self.undecided,
            RsvpStatus::In => &mut self.attending,
            RsvpStatus::Out => &mut self.declined,
            RsvpStatus::Waitlist => &mut self.waitlist,
        }
    }

    /// ## Summary
    /// Removes `user` from every status bucket and returns where they were.
    ///
    /// `members` is left untouched.
    pub fn take(&mut self, user: UserId) -> Option<RsvpStatus> {
        let previous = self.status_of(user);
        for bucket in [
            &mut self.undecided,
            &mut self.attending,
            &mut self.declined,
            &mut self.waitlist,
        ] {
            bucket.retain(|existing| *existing != user);
        }
        previous
    }

    /// ## Summary
    /// Appends `user` to the bucket for `status`.
    ///
    /// Callers must `take` the user first to keep the buckets disjoint.
    pub fn place(&mut self, user: UserId, status: RsvpStatus) {
        self.bucket_mut(status).push(user);
    }

    /// ## Summary
    /// Checks that every member is in exactly one bucket and that no one
    /// outside `members` appears in any bucket.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let placed = self.undecided.len()
            + self.attending.len()
            + self.declined.len()
            + self.waitlist.len();

        placed == self.members.len()
            && self.members.iter().all(|member| {
                [
                    &self.undecided,
                    &self.attending,
                    &self.declined,
                    &self.waitlist,
                ]
                .iter()
                .map(|bucket| bucket.iter().filter(|user| *user == member).count())
                .sum::<usize>()
                    == 1
            })
    }
}

/// One concrete meeting instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "group")]
    pub group_id: GroupId,
    pub name: String,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub timezone: String,
    /// UTC instant of `date` at `time` in `timezone`.
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub is_override: bool,
    /// Recurrence slot this event was generated for. Kept when the event is
    /// cancelled or edited so the slot is never generated twice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_starts_at: Option<DateTime<Utc>>,
    /// 0 means unlimited.
    pub capacity: u32,
    #[serde(flatten)]
    pub roster: Roster,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.status, EventStatus::Cancelled)
    }

    #[must_use]
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.starts_at < now
    }
}

/// An event that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub group_id: GroupId,
    pub name: String,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub timezone: String,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub is_override: bool,
    pub capacity: u32,
    pub roster: Roster,
}

impl NewEvent {
    /// ## Summary
    /// Assigns identity and bookkeeping fields.
    #[must_use]
    pub fn into_event(self, id: EventId, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            group_id: self.group_id,
            name: self.name,
            date: self.date,
            time: self.time,
            timezone: self.timezone,
            starts_at: self.starts_at,
            location: self.location,
            status: self.status,
            is_override: self.is_override,
            slot_starts_at: None,
            capacity: self.capacity,
            roster: self.roster,
            version: 0,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = schema::event)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EventRow {
    pub id: uuid::Uuid,
    pub group_id: uuid::Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub timezone: String,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub is_override: bool,
    pub slot_starts_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub members: Vec<uuid::Uuid>,
    pub undecided: Vec<uuid::Uuid>,
    pub attending: Vec<uuid::Uuid>,
    pub declined: Vec<uuid::Uuid>,
    pub waitlist: Vec<uuid::Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    /// ## Summary
    /// Builds the row written for `event`, stamped with `updated_at`.
    ///
    /// ## Errors
    /// Returns `DbError::DecodeError` if the capacity does not fit the column.
    pub fn from_event(event: &Event, updated_at: DateTime<Utc>) -> DbResult<Self> {
        Ok(Self {
            id: event.id,
            group_id: event.group_id,
            name: event.name.clone(),
            date: event.date,
            time: event.time.to_string(),
            timezone: event.timezone.clone(),
            starts_at: event.starts_at,
            location: event.location.clone(),
            status: event.status,
            is_override: event.is_override,
            slot_starts_at: event.slot_starts_at,
            capacity: i32::try_from(event.capacity).map_err(|_err| {
                DbError::DecodeError(format!("capacity {} too large", event.capacity))
            })?,
            members: event.roster.members.clone(),
            undecided: event.roster.undecided.clone(),
            attending: event.roster.attending.clone(),
            declined: event.roster.declined.clone(),
            waitlist: event.roster.waitlist.clone(),
            version: event.version,
            created_at: event.created_at,
            updated_at,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let time = row
            .time
            .parse::<ClockTime>()
            .map_err(|err| DbError::DecodeError(format!("event {}: {err}", row.id)))?;
        let capacity = u32::try_from(row.capacity).map_err(|_err| {
            DbError::DecodeError(format!("event {} has negative capacity", row.id))
        })?;

        Ok(Self {
            id: row.id,
            group_id: row.group_id,
            name: row.name,
            date: row.date,
            time,
            timezone: row.timezone,
            starts_at: row.starts_at,
            location: row.location,
            status: row.status,
            is_override: row.is_override,
            slot_starts_at: row.slot_starts_at,
            capacity,
            roster: Roster {
                members: row.members,
                undecided: row.undecided,
                attending: row.attending,
                declined: row.declined,
                waitlist: row.waitlist,
            },
            version: row.version,
            created_at: row.created_at,
        })
    }
}
