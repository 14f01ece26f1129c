use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use salvo::Service;

use cadence_core::config::{
    DatabaseConfig, JobsConfig, LoggingConfig, RsvpConfig, ServerConfig, Settings,
};
use cadence_rule::ClockTime;
use cadence_db::{Event, EventStatus, Group, MemoryStore, NewEvent, Roster, ScheduleStore};
use cadence_service::{RecordingSink, ServiceContext};

use crate::app::router;

pub const TEST_SECRET: &str = "test-secret";

pub fn user(n: u128) -> uuid::Uuid {
    uuid::Uuid::from_u128(n)
}

pub fn settings() -> Settings {
    Settings {
        database: DatabaseConfig {
            url: "postgres://localhost/cadence_test".to_string(),
            max_connections: 1,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8700,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        jobs: JobsConfig {
            secret: TEST_SECRET.to_string(),
            interval_secs: None,
            concurrency: 2,
        },
        rsvp: RsvpConfig { max_retries: 3 },
    }
}

pub fn scheduled_group(id: u128) -> Group {
    Group {
        id: user(1000 + id),
        name: format!("Group {id}"),
        owner: user(1),
        members: vec![user(2), user(3)],
        moderators: vec![],
        schedule: Some(serde_json::json!({ "frequency": "daily" })),
        time: Some("07:00 PM".to_string()),
        timezone: Some("America/Chicago".to_string()),
        default_capacity: 0,
        default_location: None,
    }
}

/// In-memory application wired exactly like the server binary.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
    ctx: ServiceContext,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let ctx = ServiceContext::new(store.clone())
            .with_notifier(sink.clone())
            .with_max_retries(3);
        Self { store, sink, ctx }
    }

    pub fn service(&self) -> Service {
        Service::new(router(self.ctx.clone(), settings()))
    }

    /// An upcoming one-off event for users 1 to 3.
    pub async fn event_with_capacity(&self, capacity: u32) -> Event {
        let starts_at = Utc::now() + TimeDelta::days(3);
        self.store
            .insert_event(NewEvent {
                group_id: user(1000),
                name: "Board games".to_string(),
                date: starts_at.date_naive(),
                time: ClockTime::from_hm(19, 0).expect("valid time"),
                timezone: "UTC".to_string(),
                starts_at,
                location: None,
                status: EventStatus::Scheduled,
                is_override: true,
                capacity,
                roster: Roster::seeded(vec![user(1), user(2), user(3)]),
            })
            .await
            .expect("insert event")
    }
}
