//! RSVP submissions over HTTP: roster exclusivity, capacity and the waitlist.

use salvo::http::StatusCode;

use cadence_test::component::core::types::RsvpStatus;
use cadence_test::component::service::Notification;
use cadence_test::fixtures::user;

use super::helpers::{TestApp, ids};

fn users(range: std::ops::RangeInclusive<u128>) -> Vec<uuid::Uuid> {
    range.map(user).collect()
}

#[test_log::test(tokio::test)]
async fn in_then_out_leaves_user_only_in_out() {
    let app = TestApp::new();
    let event = app.upcoming_event(0, users(1..=3)).await;

    let (status, body) = app.rsvp(event.id, user(2), "in").await;
    assert_eq!(status, Some(StatusCode::OK));
    assert_eq!(ids(&body, "in"), vec![user(2)]);
    assert!(!ids(&body, "undecided").contains(&user(2)));

    let (status, body) = app.rsvp(event.id, user(2), "out").await;
    assert_eq!(status, Some(StatusCode::OK));
    assert!(ids(&body, "in").is_empty());
    assert_eq!(ids(&body, "out"), vec![user(2)]);

    let stored = app.event(event.id).await;
    assert_eq!(stored.roster.status_of(user(2)), Some(RsvpStatus::Out));
    assert!(stored.roster.is_consistent());
}

#[test_log::test(tokio::test)]
async fn waitlist_is_promoted_in_join_order() {
    let app = TestApp::new();
    let event = app.upcoming_event(1, users(1..=4)).await;

    for n in [1, 2, 3] {
        let (status, _) = app.rsvp(event.id, user(n), "in").await;
        assert_eq!(status, Some(StatusCode::OK));
    }
    let before = app.event(event.id).await;
    assert_eq!(before.roster.attending, vec![user(1)]);
    assert_eq!(before.roster.waitlist, vec![user(2), user(3)]);

    let (_, body) = app.rsvp(event.id, user(1), "out").await;
    assert_eq!(ids(&body, "in"), vec![user(2)]);
    assert_eq!(ids(&body, "waitlist"), vec![user(3)]);

    let promoted: Vec<_> = app
        .sink
        .drain()
        .into_iter()
        .filter_map(|notification| match notification {
            Notification::WaitlistPromoted { user, .. } => Some(user),
            Notification::EventScheduled { .. } => None,
        })
        .collect();
    assert_eq!(promoted, vec![user(2)]);
}

#[test_log::test(tokio::test)]
async fn concurrent_rsvps_respect_capacity() {
    let app = TestApp::new();
    let event = app.upcoming_event(2, users(1..=8)).await;

    let results =
        futures::future::join_all((1..=8).map(|n| app.rsvp(event.id, user(n), "in"))).await;

    let accepted = results
        .iter()
        .filter(|(status, _)| *status == Some(StatusCode::OK))
        .count();
    for (status, body) in &results {
        assert!(
            *status == Some(StatusCode::OK) || *status == Some(StatusCode::CONFLICT),
            "unexpected {status:?}: {body}"
        );
    }

    let stored = app.event(event.id).await;
    assert!(stored.roster.is_consistent());
    assert_eq!(stored.roster.attending.len(), accepted.min(2));
    assert_eq!(
        stored.roster.attending.len() + stored.roster.waitlist.len(),
        accepted
    );
}

#[test_log::test(tokio::test)]
async fn mixed_sequence_keeps_roster_invariants() {
    let app = TestApp::new();
    let event = app.upcoming_event(3, users(1..=6)).await;

    let script = [
        (1, "in"),
        (2, "in"),
        (3, "in"),
        (4, "in"),
        (5, "out"),
        (2, "out"),
        (6, "in"),
        (1, "out"),
        (2, "in"),
        (4, "out"),
        (5, "in"),
    ];
    for (n, status) in script {
        let (code, _) = app.rsvp(event.id, user(n), status).await;
        assert_eq!(code, Some(StatusCode::OK));

        let stored = app.event(event.id).await;
        assert!(stored.roster.is_consistent(), "roster broke after {n} {status}");
        assert!(stored.roster.attending.len() <= 3, "over capacity after {n} {status}");
    }
}

#[test_log::test(tokio::test)]
async fn errors_are_distinguishable() {
    let app = TestApp::new();
    let event = app.upcoming_event(0, users(1..=2)).await;

    let (status, body) = app.rsvp(event.id, user(2), "maybe").await;
    assert_eq!(status, Some(StatusCode::BAD_REQUEST));
    assert!(body["error"].as_str().is_some_and(|e| e.contains("maybe")));

    let (status, _) = app.rsvp(event.id, user(50), "in").await;
    assert_eq!(status, Some(StatusCode::FORBIDDEN));

    let (status, _) = app.rsvp(user(777), user(2), "in").await;
    assert_eq!(status, Some(StatusCode::NOT_FOUND));

    let stored = app.event(event.id).await;
    assert_eq!(stored.version, 0);
}
