//! Wall-clock meeting times in 12-hour notation.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};

/// A time of day as groups write it, e.g. `"05:00 PM"`.
///
/// `12:00 AM` is midnight and `12:00 PM` is noon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// ## Summary
    /// Builds a clock time from a 24-hour hour and minute.
    ///
    /// ## Errors
    /// Returns `RuleError::InvalidTime` if the hour or minute is out of range.
    pub fn from_hm(hour: u32, minute: u32) -> RuleResult<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| RuleError::InvalidTime(format!("{hour:02}:{minute:02}")))
    }

    #[must_use]
    pub const fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for ClockTime {
    /// Seconds and sub-seconds are dropped; meeting times are minute-granular.
    fn from(time: NaiveTime) -> Self {
        Self(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time))
    }
}

impl FromStr for ClockTime {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuleError::InvalidTime(s.to_string());

        let upper = s.trim().to_ascii_uppercase();
        let (clock, is_pm) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest, false)
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest, true)
        } else {
            return Err(invalid());
        };

        let (hour, minute) = clock.trim_end().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let hour: u32 = hour.parse().map_err(|_err| invalid())?;
        let minute: u32 = minute.parse().map_err(|_err| invalid())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(invalid());
        }

        let hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };

        Self::from_hm(hour, minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%I:%M %p"))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}
