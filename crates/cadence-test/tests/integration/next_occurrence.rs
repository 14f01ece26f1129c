//! Next-occurrence examples, checked through the public rule API.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde_json::json;

use cadence_test::component::rule::{ClockTime, RecurrenceRule, RuleError, next_occurrence};

const ZONE: Tz = chrono_tz::America::Denver;

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    ZONE.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn six_pm() -> ClockTime {
    "06:00 PM".parse().expect("valid time")
}

fn next(rule: serde_json::Value, now: DateTime<Utc>) -> NaiveDate {
    let rule = RecurrenceRule::from_json(rule).expect("valid rule");
    next_occurrence(&rule, now, six_pm(), ZONE)
        .expect("occurrence")
        .date
}

#[test_log::test]
fn weekly_from_monday_morning_is_this_wednesday() {
    let rule = json!({ "frequency": "weekly", "days": [{ "day": 3 }] });
    // 2026-10-19 is a Monday
    assert_eq!(next(rule, local(2026, 10, 19, 10, 0)), date(2026, 10, 21));
}

#[test_log::test]
fn weekly_just_after_start_rolls_to_next_week() {
    let rule = json!({ "frequency": "weekly", "days": [{ "day": 3 }] });
    assert_eq!(next(rule, local(2026, 10, 21, 18, 1)), date(2026, 10, 28));
}

#[test_log::test]
fn monthly_after_target_day_is_next_month() {
    let rule = json!({ "frequency": "monthly", "days": [{ "day": 15 }] });
    assert_eq!(next(rule, local(2026, 10, 20, 9, 0)), date(2026, 11, 15));
}

#[test_log::test]
fn second_wednesday_from_first_wednesday() {
    let rule = json!({ "frequency": "ordinal", "occurrence": "2nd", "weekday": 3 });
    // 2026-10-07 is the first Wednesday of October
    let found = next(rule, local(2026, 10, 7, 12, 0));
    assert_eq!(found, date(2026, 10, 14));
    assert_eq!(found.weekday(), Weekday::Wed);
}

#[test_log::test]
fn custom_picks_earlier_routine() {
    let rule = json!({
        "frequency": "custom",
        "routines": [
            { "frequency": "weekly", "days": [{ "day": 1 }] },
            { "frequency": "monthly", "days": [{ "day": 1 }] },
        ],
    });

    // Saturday 2026-10-24: next Monday (26th) beats November 1st
    let rule_value = rule.clone();
    assert_eq!(next(rule_value, local(2026, 10, 24, 9, 0)), date(2026, 10, 26));

    // Tuesday 2026-10-27: November 1st (a Sunday) beats next Monday (2nd)
    let parsed = RecurrenceRule::from_json(rule).expect("valid rule");
    let occurrence =
        next_occurrence(&parsed, local(2026, 10, 27, 9, 0), six_pm(), ZONE).expect("occurrence");
    assert_eq!(occurrence.date, date(2026, 11, 1));
    assert_eq!(occurrence.routine, 1);
}

#[test_log::test]
fn malformed_rules_are_rejected() {
    for bad in [
        json!({ "frequency": "weekly", "days": [] }),
        json!({ "frequency": "weekly", "days": [{ "day": 7 }] }),
        json!({ "frequency": "monthly", "days": [{ "day": 32 }] }),
        json!({ "frequency": "custom", "routines": [] }),
        json!({ "frequency": "fortnightly" }),
    ] {
        assert!(
            matches!(RecurrenceRule::from_json(bad.clone()), Err(RuleError::InvalidRule(_))),
            "accepted {bad}"
        );
    }
}
