//! Recurrence rule model.
//!
//! Rules are stored as JSON tagged by `frequency`:
//!
//! ```json
//! { "frequency": "weekly", "days": [{ "day": 3 }], "time": "06:00 PM" }
//! { "frequency": "ordinal", "occurrence": "2nd", "weekday": 3 }
//! { "frequency": "custom", "routines": [
//!     { "frequency": "weekly", "days": [{ "day": 1 }] },
//!     { "frequency": "monthly", "days": [{ "day": 1, "time": "09:00 AM" }] }
//! ] }
//! ```
//!
//! Weekdays are indexed 0 (Sunday) through 6 (Saturday).

use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::error::{RuleError, RuleResult};
use crate::zone;

/// Maximum number of routines in a custom schedule.
pub const MAX_ROUTINES: usize = 5;

/// One target point of a weekly or monthly rule with an optional own time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTime {
    /// Weekday index for weekly rules, day of month for monthly rules.
    pub day: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
}

impl DayTime {
    #[must_use]
    pub const fn new(day: u8) -> Self {
        Self { day, time: None }
    }

    #[must_use]
    pub const fn at(day: u8, time: ClockTime) -> Self {
        Self {
            day,
            time: Some(time),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Shared shape of weekly and biweekly rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayRule {
    pub days: Vec<DayTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRule {
    pub days: Vec<DayTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Which instance of a weekday within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ordinal {
    #[serde(rename = "1st", alias = "first")]
    First,
    #[serde(rename = "2nd", alias = "second")]
    Second,
    #[serde(rename = "3rd", alias = "third")]
    Third,
    #[serde(rename = "4th", alias = "fourth")]
    Fourth,
    #[serde(rename = "5th", alias = "fifth")]
    Fifth,
    #[serde(rename = "last", alias = "Last")]
    Last,
}

impl Ordinal {
    /// Position as used by an RFC 5545 `BYDAY` prefix.
    #[must_use]
    pub const fn position(self) -> i8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Fifth => 5,
            Self::Last => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinalRule {
    pub occurrence: Ordinal,
    pub weekday: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// A single-frequency schedule. Custom schedules are lists of these, so a
/// routine can never itself be custom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "lowercase")]
pub enum Routine {
    Daily(DailyRule),
    Weekly(WeekdayRule),
    Biweekly(WeekdayRule),
    Monthly(MonthlyRule),
    Ordinal(OrdinalRule),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub routines: Vec<Routine>,
}

/// How often, and on which calendar points, a group meets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "lowercase")]
pub enum RecurrenceRule {
    Daily(DailyRule),
    Weekly(WeekdayRule),
    Biweekly(WeekdayRule),
    Monthly(MonthlyRule),
    Ordinal(OrdinalRule),
    Custom(CustomRule),
}

impl From<Routine> for RecurrenceRule {
    fn from(routine: Routine) -> Self {
        match routine {
            Routine::Daily(rule) => Self::Daily(rule),
            Routine::Weekly(rule) => Self::Weekly(rule),
            Routine::Biweekly(rule) => Self::Biweekly(rule),
            Routine::Monthly(rule) => Self::Monthly(rule),
            Routine::Ordinal(rule) => Self::Ordinal(rule),
        }
    }
}

impl RecurrenceRule {
    /// ## Summary
    /// Decodes a rule from its stored JSON form and validates it.
    ///
    /// ## Errors
    /// Returns `RuleError::InvalidRule` if the JSON does not describe a rule,
    /// or any validation error from [`RecurrenceRule::validate`].
    pub fn from_json(value: serde_json::Value) -> RuleResult<Self> {
        let rule: Self = serde_json::from_value(value)
            .map_err(|err| RuleError::InvalidRule(err.to_string()))?;
        rule.validate()?;
        Ok(rule)
    }

    /// ## Summary
    /// Checks the shape invariants of the rule.
    ///
    /// - weekly/biweekly need at least one weekday, each in `0..=6`
    /// - monthly needs at least one day of month, each in `1..=31`
    /// - ordinal needs a weekday in `0..=6`
    /// - custom needs between 1 and [`MAX_ROUTINES`] routines
    /// - every timezone override must be a known IANA zone
    ///
    /// ## Errors
    /// Returns `RuleError::InvalidRule` naming the offending field, or
    /// `RuleError::UnknownTimezone` for a bad override zone.
    pub fn validate(&self) -> RuleResult<()> {
        match self {
            Self::Daily(rule) => validate_daily(rule),
            Self::Weekly(rule) | Self::Biweekly(rule) => validate_weekday(rule),
            Self::Monthly(rule) => validate_monthly(rule),
            Self::Ordinal(rule) => validate_ordinal(rule),
            Self::Custom(rule) => {
                if rule.routines.is_empty() {
                    return Err(RuleError::InvalidRule(
                        "custom schedule needs at least one routine".to_string(),
                    ));
                }
                if rule.routines.len() > MAX_ROUTINES {
                    return Err(RuleError::InvalidRule(format!(
                        "custom schedule allows at most {MAX_ROUTINES} routines, got {}",
                        rule.routines.len()
                    )));
                }
                rule.routines.iter().try_for_each(Routine::validate)
            }
        }
    }
}

impl Routine {
    /// ## Errors
    /// Same as [`RecurrenceRule::validate`].
    pub fn validate(&self) -> RuleResult<()> {
        match self {
            Self::Daily(rule) => validate_daily(rule),
            Self::Weekly(rule) | Self::Biweekly(rule) => validate_weekday(rule),
            Self::Monthly(rule) => validate_monthly(rule),
            Self::Ordinal(rule) => validate_ordinal(rule),
        }
    }
}

fn validate_zone(timezone: Option<&str>) -> RuleResult<()> {
    timezone.map_or(Ok(()), |name| zone::resolve(name).map(|_tz| ()))
}

fn validate_weekday_index(day: u8, field: &str) -> RuleResult<()> {
    if day > 6 {
        return Err(RuleError::InvalidRule(format!(
            "{field} must be a weekday index 0-6, got {day}"
        )));
    }
    Ok(())
}

fn validate_daily(rule: &DailyRule) -> RuleResult<()> {
    validate_zone(rule.timezone.as_deref())
}

fn validate_weekday(rule: &WeekdayRule) -> RuleResult<()> {
    if rule.days.is_empty() {
        return Err(RuleError::InvalidRule(
            "weekly schedule needs at least one weekday".to_string(),
        ));
    }
    for entry in &rule.days {
        validate_weekday_index(entry.day, "days.day")?;
    }
    validate_zone(rule.timezone.as_deref())
}

fn validate_monthly(rule: &MonthlyRule) -> RuleResult<()> {
    if rule.days.is_empty() {
        return Err(RuleError::InvalidRule(
            "monthly schedule needs at least one day of month".to_string(),
        ));
    }
    for entry in &rule.days {
        if !(1..=31).contains(&entry.day) {
            return Err(RuleError::InvalidRule(format!(
                "days.day must be a day of month 1-31, got {}",
                entry.day
            )));
        }
    }
    validate_zone(rule.timezone.as_deref())
}

fn validate_ordinal(rule: &OrdinalRule) -> RuleResult<()> {
    validate_weekday_index(rule.weekday, "weekday")?;
    validate_zone(rule.timezone.as_deref())
}
