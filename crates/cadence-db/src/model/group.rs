use cadence_core::types::{GroupId, UserId};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;
use crate::error::{DbError, DbResult};

/// A group that meets, optionally on a recurring schedule.
///
/// `schedule`, `time` and `timezone` are kept in their persisted form. They are
/// parsed where they are used so one malformed schedule only fails that group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub owner: UserId,
    #[serde(default)]
    pub members: Vec<UserId>,
    #[serde(default)]
    pub moderators: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<serde_json::Value>,
    pub time: Option<String>,
    pub timezone: Option<String>,
    /// 0 means unlimited.
    #[serde(default)]
    pub default_capacity: u32,
    pub default_location: Option<String>,
}

impl Group {
    /// ## Summary
    /// Users entitled to RSVP: the owner followed by members, without duplicates.
    #[must_use]
    pub fn entitled_users(&self) -> Vec<UserId> {
        let mut users = Vec::with_capacity(self.members.len() + 1);
        users.push(self.owner);
        for member in &self.members {
            if !users.contains(member) {
                users.push(*member);
            }
        }
        users
    }

    #[must_use]
    pub fn is_member(&self, user: UserId) -> bool {
        self.owner == user || self.members.contains(&user)
    }

    #[must_use]
    pub const fn has_schedule(&self) -> bool {
        self.schedule.is_some()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = schema::group)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct GroupRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub owner_id: uuid::Uuid,
    pub members: Vec<uuid::Uuid>,
    pub moderators: Vec<uuid::Uuid>,
    pub schedule: Option<serde_json::Value>,
    pub time: Option<String>,
    pub timezone: Option<String>,
    pub default_capacity: i32,
    pub default_location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl GroupRow {
    /// ## Summary
    /// Builds the row written for `group`, stamped with `updated_at`.
    ///
    /// ## Errors
    /// Returns `DbError::DecodeError` if the capacity does not fit the column.
    pub fn from_group(group: &Group, updated_at: DateTime<Utc>) -> DbResult<Self> {
        Ok(Self {
            id: group.id,
            name: group.name.clone(),
            owner_id: group.owner,
            members: group.members.clone(),
            moderators: group.moderators.clone(),
            schedule: group.schedule.clone(),
            time: group.time.clone(),
            timezone: group.timezone.clone(),
            default_capacity: i32::try_from(group.default_capacity).map_err(|_err| {
                DbError::DecodeError(format!("capacity {} too large", group.default_capacity))
            })?,
            default_location: group.default_location.clone(),
            updated_at,
        })
    }
}

impl TryFrom<GroupRow> for Group {
    type Error = DbError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            owner: row.owner_id,
            members: row.members,
            moderators: row.moderators,
            schedule: row.schedule,
            time: row.time,
            timezone: row.timezone,
            default_capacity: u32::try_from(row.default_capacity).map_err(|_err| {
                DbError::DecodeError(format!("group {} has negative capacity", row.id))
            })?,
            default_location: row.default_location,
        })
    }
}
