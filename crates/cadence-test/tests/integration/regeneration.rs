//! The regeneration trigger, end to end over HTTP.

use chrono::{TimeDelta, Utc};
use salvo::http::StatusCode;
use serde_json::json;

use cadence_test::component::db::{EventStatus, Group, NewEvent, Roster, ScheduleStore};
use cadence_test::component::rule::ClockTime;
use cadence_test::component::service::Notification;
use cadence_test::component::service::events::{EventPatch, cancel_event, override_event};
use cadence_test::fixtures::{JOB_SECRET, group_with_schedule, weekly_group};

use super::helpers::TestApp;

#[test_log::test(tokio::test)]
async fn trigger_without_valid_secret_is_unauthorized() {
    let app = TestApp::new();
    app.save_group(&weekly_group(1, 3)).await;

    let (status, body) = app.regenerate(None).await;
    assert_eq!(status, Some(StatusCode::UNAUTHORIZED));
    assert!(body["error"].is_string());

    let (status, _) = app.regenerate(Some("guess")).await;
    assert_eq!(status, Some(StatusCode::UNAUTHORIZED));

    // Nothing ran
    assert!(app.store.events_for_group(weekly_group(1, 3).id).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn regeneration_is_idempotent() {
    let app = TestApp::new();
    for id in 1..=5 {
        app.save_group(&weekly_group(id, u8::try_from(id % 7).expect("small")))
            .await;
    }

    let first = app.regenerate_authorized().await;
    assert_eq!(first["regenerated"], 5);
    assert_eq!(first["deleted"], 0);

    let second = app.regenerate_authorized().await;
    assert_eq!(second["regenerated"], 0);
    assert_eq!(second["deleted"], 0);

    for id in 1..=5 {
        let group = weekly_group(id, 0);
        let events = app.store.events_for_group(group.id).await;
        assert_eq!(events.len(), 1, "group {id} should have one generated event");
        assert!(!events[0].is_override);
    }
}

#[test_log::test(tokio::test)]
async fn cancelled_and_edited_meetings_are_not_generated_again() {
    let app = TestApp::new();
    let group = weekly_group(1, 3);
    app.save_group(&group).await;

    app.regenerate_authorized().await;
    let event = app.store.events_for_group(group.id).await.remove(0);

    cancel_event(&app.ctx, event.id).await.expect("cancel");
    let body = app.regenerate_authorized().await;
    assert_eq!(body["regenerated"], 0);
    assert_eq!(body["skipped"], 1);

    override_event(
        &app.ctx,
        event.id,
        EventPatch {
            location: Some("Library".to_string()),
            ..EventPatch::default()
        },
    )
    .await
    .expect("override");
    let body = app.regenerate_authorized().await;
    assert_eq!(body["regenerated"], 0);

    let events = app.store.events_for_group(group.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EventStatus::Cancelled);
    assert_eq!(events[0].location.as_deref(), Some("Library"));
}

#[test_log::test(tokio::test)]
async fn generated_event_is_seeded_from_group() {
    let app = TestApp::new();
    let group = weekly_group(1, 5);
    app.save_group(&group).await;

    app.regenerate_authorized().await;

    let events = app.store.events_for_group(group.id).await;
    let event = &events[0];
    assert_eq!(event.name, group.name);
    assert_eq!(event.timezone, "America/Chicago");
    assert_eq!(event.location.as_deref(), Some("Library"));
    assert_eq!(event.time.to_string(), "06:00 PM");
    assert_eq!(event.roster.undecided, group.entitled_users());
    assert!(event.roster.attending.is_empty());

    let scheduled: Vec<_> = app
        .sink
        .drain()
        .into_iter()
        .filter(|notification| matches!(notification, Notification::EventScheduled { .. }))
        .collect();
    assert_eq!(scheduled.len(), 1);
}

#[test_log::test(tokio::test)]
async fn malformed_schedule_does_not_abort_batch() {
    let app = TestApp::new();
    let broken = group_with_schedule(
        1,
        Some(json!({ "frequency": "monthly", "days": [{ "day": 40 }] })),
        2,
    );
    app.save_group(&broken).await;
    app.save_group(&weekly_group(2, 1)).await;
    app.save_group(&weekly_group(3, 4)).await;

    let body = app.regenerate_authorized().await;

    assert_eq!(body["regenerated"], 2);
    let failures = body["failures"].as_array().expect("failures array");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["group"], json!(broken.id));
    assert!(
        failures[0]["error"]
            .as_str()
            .is_some_and(|error| error.contains("day"))
    );
}

#[test_log::test(tokio::test)]
async fn one_off_events_neither_block_nor_get_replaced() {
    let app = TestApp::new();
    let group = weekly_group(1, 2);
    app.save_group(&group).await;

    let one_off = app
        .store
        .insert_event(one_off_for(&group))
        .await
        .expect("insert override");

    let body = app.regenerate_authorized().await;
    assert_eq!(body["regenerated"], 1);

    let events = app.store.events_for_group(group.id).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().any(|event| event.id == one_off.id));
    assert_eq!(events.iter().filter(|event| !event.is_override).count(), 1);
}

#[test_log::test(tokio::test)]
async fn concurrent_triggers_create_one_event_per_group() {
    let app = TestApp::new();
    for id in 1..=4 {
        app.save_group(&weekly_group(id, 3)).await;
    }

    let results = futures::future::join_all((0..4).map(|_| app.regenerate(Some(JOB_SECRET)))).await;

    let mut total = 0;
    for (status, body) in results {
        assert_eq!(status, Some(StatusCode::OK));
        total += body["regenerated"].as_u64().expect("count");
    }
    assert_eq!(total, 4);

    for id in 1..=4 {
        assert_eq!(app.store.events_for_group(weekly_group(id, 3).id).await.len(), 1);
    }
}

fn one_off_for(group: &Group) -> NewEvent {
    let starts_at = Utc::now() + TimeDelta::days(1);
    NewEvent {
        group_id: group.id,
        name: "Special session".to_string(),
        date: starts_at.date_naive(),
        time: ClockTime::from_hm(12, 0).expect("valid time"),
        timezone: "UTC".to_string(),
        starts_at,
        location: None,
        status: EventStatus::Scheduled,
        is_override: true,
        capacity: 0,
        roster: Roster::seeded(group.entitled_users()),
    }
}
