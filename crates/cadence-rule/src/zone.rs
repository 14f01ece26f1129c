//! Timezone resolution and wall-clock localization.

use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::clock::ClockTime;
use crate::error::{RuleError, RuleResult};

/// ## Summary
/// Resolves an IANA timezone name such as `America/Chicago`.
///
/// ## Errors
/// Returns `RuleError::UnknownTimezone` if the name is not in the tz database.
pub fn resolve(name: &str) -> RuleResult<Tz> {
    Tz::from_str(name.trim()).map_err(|_err| RuleError::UnknownTimezone(name.to_string()))
}

/// ## Summary
/// Pins a local wall-clock datetime to an instant in `zone`.
///
/// A time inside a DST gap is shifted forward one hour. A time inside a DST
/// fold resolves to the earlier of the two instants.
///
/// ## Errors
/// Returns `RuleError::NonExistentTime` if the shifted time still does not exist.
pub fn localize(zone: Tz, local: NaiveDateTime) -> RuleResult<DateTime<Tz>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => {
            tracing::trace!(%local, zone = %zone.name(), "Local time falls in DST gap, shifting");
            zone.from_local_datetime(&(local + TimeDelta::hours(1)))
                .earliest()
                .ok_or_else(|| RuleError::NonExistentTime(format!("{local} in {}", zone.name())))
        }
    }
}

/// ## Summary
/// Returns the UTC instant a meeting on `date` at `time` in `zone` starts.
///
/// ## Errors
/// Returns `RuleError::NonExistentTime` if the wall-clock time cannot be placed.
pub fn start_instant(date: NaiveDate, time: ClockTime, zone: Tz) -> RuleResult<DateTime<Utc>> {
    localize(zone, date.and_time(time.as_naive())).map(|dt| dt.with_timezone(&Utc))
}
