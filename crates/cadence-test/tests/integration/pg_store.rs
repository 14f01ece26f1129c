//! `PgStore` against a real database. Skipped unless
//! `CADENCE_TEST_DATABASE_URL` is set.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use cadence_test::component::db::{EventStatus, InsertOutcome, NewEvent, Roster, ScheduleStore};
use cadence_test::component::rule::ClockTime;
use cadence_test::component::service::{EventRegenerationJob, ServiceContext, rsvp};
use cadence_test::fixtures::{user, weekly_group};

use super::helpers::TestDb;

fn generated(group_id: uuid::Uuid, days_ahead: i64) -> NewEvent {
    let starts_at = Utc::now() + TimeDelta::days(days_ahead);
    NewEvent {
        group_id,
        name: "Generated".to_string(),
        date: starts_at.date_naive(),
        time: ClockTime::from_hm(18, 0).expect("valid time"),
        timezone: "UTC".to_string(),
        starts_at,
        location: None,
        status: EventStatus::Scheduled,
        is_override: false,
        capacity: 1,
        roster: Roster::seeded(vec![user(1), user(2), user(3)]),
    }
}

#[test_log::test(tokio::test)]
async fn group_round_trips_through_upsert() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store();

    let mut group = weekly_group(1, 3);
    store.save_group(&group).await.expect("insert group");
    group.members.push(user(40));
    group.default_capacity = 12;
    store.save_group(&group).await.expect("update group");

    let loaded = store
        .get_group(group.id)
        .await
        .expect("get group")
        .expect("group exists");
    assert_eq!(loaded, group);

    db.drop_database().await;
}

#[test_log::test(tokio::test)]
async fn concurrent_generated_inserts_create_one_row() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = Arc::new(db.store());
    let group = weekly_group(1, 3);
    store.save_group(&group).await.expect("save group");

    let group_id = group.id;
    let attempts = (0..8).map(|_| {
        let store = Arc::clone(&store);
        async move {
            store
                .insert_generated_event_if_absent(generated(group_id, 2), Utc::now())
                .await
                .expect("insert")
        }
    });
    let outcomes = futures::future::join_all(attempts).await;

    let created = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, InsertOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);

    let upcoming = store
        .list_upcoming_events_for_group(group.id, Utc::now())
        .await
        .expect("list");
    assert_eq!(upcoming.len(), 1);

    drop(store);
    db.drop_database().await;
}

#[test_log::test(tokio::test)]
async fn cancelled_generated_event_keeps_its_slot() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store();
    let group = weekly_group(1, 3);
    store.save_group(&group).await.expect("save group");

    let InsertOutcome::Created(event) = store
        .insert_generated_event_if_absent(generated(group.id, 2), Utc::now())
        .await
        .expect("insert")
    else {
        panic!("expected a new event");
    };
    assert_eq!(event.slot_starts_at, Some(event.starts_at));

    let mut cancelled = (*event).clone();
    cancelled.status = EventStatus::Cancelled;
    cancelled.is_override = true;
    store
        .update_event_if_version(&cancelled, event.version)
        .await
        .expect("update")
        .expect("version matched");

    let same_slot = NewEvent {
        starts_at: event.starts_at,
        ..generated(group.id, 2)
    };
    let outcome = store
        .insert_generated_event_if_absent(same_slot, Utc::now())
        .await
        .expect("insert");
    assert_eq!(outcome, InsertOutcome::SlotClaimed);

    let later = store
        .insert_generated_event_if_absent(generated(group.id, 9), Utc::now())
        .await
        .expect("insert");
    assert!(matches!(later, InsertOutcome::Created(_)));

    db.drop_database().await;
}

#[test_log::test(tokio::test)]
async fn stale_version_write_is_refused() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store();
    store
        .save_group(&weekly_group(1, 3))
        .await
        .expect("save group");

    let event = store
        .insert_event(NewEvent {
            is_override: true,
            ..generated(weekly_group(1, 3).id, 1)
        })
        .await
        .expect("insert");

    let mut renamed = event.clone();
    renamed.name = "Renamed".to_string();
    let stored = store
        .update_event_if_version(&renamed, event.version)
        .await
        .expect("update")
        .expect("version matched");
    assert_eq!(stored.version, event.version + 1);

    let stale = store
        .update_event_if_version(&renamed, event.version)
        .await
        .expect("update");
    assert!(stale.is_none());

    db.drop_database().await;
}

#[test_log::test(tokio::test)]
async fn regeneration_and_rsvp_against_postgres() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store: Arc<dyn ScheduleStore> = Arc::new(db.store());
    let group = weekly_group(1, 4);
    store.save_group(&group).await.expect("save group");

    let ctx = ServiceContext::new(store.clone());
    let job = EventRegenerationJob::new(ctx.clone());

    let now = Utc::now();
    let first = job.run(now).await.expect("first run");
    assert_eq!(first.regenerated, 1);
    let second = job.run(now).await.expect("second run");
    assert_eq!(second.regenerated, 0);

    let events = store
        .list_upcoming_events_for_group(group.id, now)
        .await
        .expect("list");
    assert_eq!(events.len(), 1);

    let event = rsvp::submit(&ctx, events[0].id, user(2), "in".parse().expect("status"))
        .await
        .expect("rsvp");
    assert_eq!(event.roster.attending, vec![user(2)]);
    assert!(event.roster.is_consistent());
    assert_eq!(event.version, 1);

    drop((ctx, job, store));
    db.drop_database().await;
}
