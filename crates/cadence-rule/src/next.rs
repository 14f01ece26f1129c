//! Next-occurrence calculation.
//!
//! Weekly-style rules (daily, weekly, biweekly) are resolved against the
//! Sunday-based week containing "now" in the group's zone. Month-based rules
//! (monthly, ordinal) are expanded through `rrule`, which skips months that
//! lack the requested day: `monthly{31}` evaluated in November lands on
//! December 31st, and a 5th-weekday rule skips months with only four.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::clock::ClockTime;
use crate::error::{RuleError, RuleResult};
use crate::rule::{DailyRule, MonthlyRule, OrdinalRule, RecurrenceRule, Routine, WeekdayRule};
use crate::zone;

/// RFC 5545 weekday codes indexed from Sunday.
const WEEKDAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Occurrences requested from `rrule` per expansion; only the first at or
/// after "now" is used.
const RRULE_LOOKAHEAD: u16 = 4;

/// A concrete meeting slot produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Local calendar date in `timezone`.
    pub date: NaiveDate,
    /// Local wall-clock time in `timezone`.
    pub time: ClockTime,
    pub timezone: Tz,
    pub starts_at: DateTime<Utc>,
    /// Index of the routine that produced this slot; always 0 for single rules.
    pub routine: usize,
}

impl Occurrence {
    fn from_local(local: DateTime<Tz>, routine: usize) -> Self {
        Self {
            date: local.date_naive(),
            time: ClockTime::from(local.time()),
            timezone: local.timezone(),
            starts_at: local.with_timezone(&Utc),
            routine,
        }
    }
}

/// Fallback time and zone applied where the rule does not override them.
#[derive(Debug, Clone, Copy)]
struct Defaults {
    time: ClockTime,
    zone: Tz,
}

/// ## Summary
/// Computes the first occurrence of `rule` starting at or after `now`.
///
/// `default_time` and `default_zone` are the group's meeting time and zone;
/// a routine's own `time`/`timezone`, or a day entry's `time`, take precedence.
/// For custom rules the earliest routine wins, and on an exact tie the routine
/// listed first.
///
/// ## Errors
/// Returns `RuleError::InvalidRule` (or another `RuleError`) if the rule is
/// malformed. Invalid rules are never silently defaulted.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    now: DateTime<Utc>,
    default_time: ClockTime,
    default_zone: Tz,
) -> RuleResult<Occurrence> {
    rule.validate()?;
    let defaults = Defaults {
        time: default_time,
        zone: default_zone,
    };

    let occurrence = match rule {
        RecurrenceRule::Daily(daily) => next_daily(daily, now, defaults, 0),
        RecurrenceRule::Weekly(weekly) => next_weekly(weekly, 1, now, defaults, 0),
        RecurrenceRule::Biweekly(weekly) => next_weekly(weekly, 2, now, defaults, 0),
        RecurrenceRule::Monthly(monthly) => next_monthly(monthly, now, defaults, 0),
        RecurrenceRule::Ordinal(ordinal) => next_ordinal(ordinal, now, defaults, 0),
        RecurrenceRule::Custom(custom) => {
            let mut earliest: Option<Occurrence> = None;
            for (index, routine) in custom.routines.iter().enumerate() {
                let candidate = next_for_routine(routine, now, defaults, index)?;
                tracing::trace!(
                    routine = index,
                    starts_at = %candidate.starts_at,
                    "Evaluated custom routine"
                );
                if earliest
                    .as_ref()
                    .is_none_or(|best| candidate.starts_at < best.starts_at)
                {
                    earliest = Some(candidate);
                }
            }
            earliest.ok_or_else(|| {
                RuleError::InvalidRule("custom schedule has no routines".to_string())
            })
        }
    }?;

    tracing::debug!(
        date = %occurrence.date,
        time = %occurrence.time,
        timezone = %occurrence.timezone.name(),
        "Computed next occurrence"
    );
    Ok(occurrence)
}

fn next_for_routine(
    routine: &Routine,
    now: DateTime<Utc>,
    defaults: Defaults,
    index: usize,
) -> RuleResult<Occurrence> {
    match routine {
        Routine::Daily(daily) => next_daily(daily, now, defaults, index),
        Routine::Weekly(weekly) => next_weekly(weekly, 1, now, defaults, index),
        Routine::Biweekly(weekly) => next_weekly(weekly, 2, now, defaults, index),
        Routine::Monthly(monthly) => next_monthly(monthly, now, defaults, index),
        Routine::Ordinal(ordinal) => next_ordinal(ordinal, now, defaults, index),
    }
}

fn routine_zone(timezone: Option<&str>, defaults: Defaults) -> RuleResult<Tz> {
    timezone.map_or(Ok(defaults.zone), zone::resolve)
}

fn keep_earliest(current: Option<Occurrence>, candidate: Occurrence) -> Option<Occurrence> {
    match current {
        Some(best) if best.starts_at <= candidate.starts_at => Some(best),
        _ => Some(candidate),
    }
}

fn next_daily(
    rule: &DailyRule,
    now: DateTime<Utc>,
    defaults: Defaults,
    index: usize,
) -> RuleResult<Occurrence> {
    let zone = routine_zone(rule.timezone.as_deref(), defaults)?;
    let time = rule.time.unwrap_or(defaults.time);
    let slots: Vec<(u8, ClockTime)> = (0..7).map(|day| (day, time)).collect();
    next_in_weeks(&slots, 1, zone, now, index)
}

fn next_weekly(
    rule: &WeekdayRule,
    period_weeks: i64,
    now: DateTime<Utc>,
    defaults: Defaults,
    index: usize,
) -> RuleResult<Occurrence> {
    let zone = routine_zone(rule.timezone.as_deref(), defaults)?;
    let shared = rule.time.unwrap_or(defaults.time);
    let slots: Vec<(u8, ClockTime)> = rule
        .days
        .iter()
        .map(|entry| (entry.day, entry.time.unwrap_or(shared)))
        .collect();
    next_in_weeks(&slots, period_weeks, zone, now, index)
}

/// Picks the earliest slot of the current week that has not started yet.
/// If every slot has passed, the earliest slot `period_weeks` later wins.
fn next_in_weeks(
    slots: &[(u8, ClockTime)],
    period_weeks: i64,
    zone: Tz,
    now: DateTime<Utc>,
    index: usize,
) -> RuleResult<Occurrence> {
    let today = now.with_timezone(&zone).date_naive();
    let week_start = today - TimeDelta::days(i64::from(today.weekday().num_days_from_sunday()));

    let mut this_week: Option<Occurrence> = None;
    let mut deferred: Option<Occurrence> = None;

    for &(day, time) in slots {
        let date = week_start + TimeDelta::days(i64::from(day));

        let current = slot_at(zone, date, time, index)?;
        if current.starts_at >= now {
            this_week = keep_earliest(this_week, current);
        }

        let later = slot_at(zone, date + TimeDelta::weeks(period_weeks), time, index)?;
        deferred = keep_earliest(deferred, later);
    }

    this_week
        .or(deferred)
        .ok_or_else(|| RuleError::InvalidRule("schedule has no weekdays".to_string()))
}

fn slot_at(zone: Tz, date: NaiveDate, time: ClockTime, index: usize) -> RuleResult<Occurrence> {
    let local = zone::localize(zone, date.and_time(time.as_naive()))?;
    Ok(Occurrence::from_local(local, index))
}

fn next_monthly(
    rule: &MonthlyRule,
    now: DateTime<Utc>,
    defaults: Defaults,
    index: usize,
) -> RuleResult<Occurrence> {
    let zone = routine_zone(rule.timezone.as_deref(), defaults)?;
    let shared = rule.time.unwrap_or(defaults.time);

    let mut earliest: Option<Occurrence> = None;
    for entry in &rule.days {
        let candidate = first_monthly_match(
            &format!("BYMONTHDAY={}", entry.day),
            entry.time.unwrap_or(shared),
            zone,
            now,
            index,
        )?;
        earliest = keep_earliest(earliest, candidate);
    }

    earliest.ok_or_else(|| RuleError::InvalidRule("schedule has no days of month".to_string()))
}

fn next_ordinal(
    rule: &OrdinalRule,
    now: DateTime<Utc>,
    defaults: Defaults,
    index: usize,
) -> RuleResult<Occurrence> {
    let zone = routine_zone(rule.timezone.as_deref(), defaults)?;
    let time = rule.time.unwrap_or(defaults.time);
    let code = WEEKDAY_CODES
        .get(usize::from(rule.weekday))
        .ok_or_else(|| RuleError::InvalidRule(format!("weekday {} out of range", rule.weekday)))?;

    first_monthly_match(
        &format!("BYDAY={}{code}", rule.occurrence.position()),
        time,
        zone,
        now,
        index,
    )
}

/// Expands `FREQ=MONTHLY;<selector>` at `time` in `zone` and returns the first
/// instance at or after `now`.
///
/// The series is anchored on the last day of the previous month so that the
/// anchor itself is always in the past and never counted as a match.
fn first_monthly_match(
    selector: &str,
    time: ClockTime,
    zone: Tz,
    now: DateTime<Utc>,
    index: usize,
) -> RuleResult<Occurrence> {
    let local_today = now.with_timezone(&zone).date_naive();
    let anchor = local_today
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| RuleError::NoOccurrence(format!("no month before {local_today}")))?;

    let clock = time.as_naive();
    let text = format!(
        "DTSTART;TZID={}:{}T000000\nRRULE:FREQ=MONTHLY;{selector};BYHOUR={};BYMINUTE={};BYSECOND=0",
        zone.name(),
        anchor.format("%Y%m%d"),
        clock.hour(),
        clock.minute(),
    );
    tracing::trace!(rrule = %text, "Expanding monthly rule");

    let rrule_set = text
        .parse::<RRuleSet>()
        .map_err(|err| RuleError::InvalidRule(err.to_string()))?;

    let after = (now - TimeDelta::seconds(1)).with_timezone(&rrule::Tz::UTC);
    rrule_set
        .after(after)
        .all(RRULE_LOOKAHEAD)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&zone))
        .find(|dt| dt.with_timezone(&Utc) >= now)
        .map(|local| Occurrence::from_local(local, index))
        .ok_or_else(|| RuleError::NoOccurrence(selector.to_string()))
}
