//! Cadence scheduling server - integration test support.
//!
//! Re-exports the workspace crates under one roof and provides fixtures
//! shared by the integration suites.

pub mod component {
    pub use cadence_app as app;
    pub use cadence_core as core;
    pub use cadence_db as db;
    pub use cadence_rule as rule;
    pub use cadence_service as service;
}

pub mod fixtures {
    use cadence_core::config::{
        DatabaseConfig, JobsConfig, LoggingConfig, RsvpConfig, ServerConfig, Settings,
    };
    use cadence_db::Group;
    use serde_json::Value;
    use uuid::Uuid;

    pub const JOB_SECRET: &str = "integration-secret";

    #[must_use]
    pub const fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[must_use]
    pub fn settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/cadence_integration".to_string(),
                max_connections: 2,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8700,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            jobs: JobsConfig {
                secret: JOB_SECRET.to_string(),
                interval_secs: None,
                concurrency: 4,
            },
            rsvp: RsvpConfig { max_retries: 10 },
        }
    }

    /// ## Summary
    /// A group owned by user 1 with users 2..=`members` + 1 as members.
    #[must_use]
    pub fn group_with_schedule(id: u128, schedule: Option<Value>, members: u128) -> Group {
        Group {
            id: Uuid::from_u128(10_000 + id),
            name: format!("Group {id}"),
            owner: user(1),
            members: (2..=members + 1).map(user).collect(),
            moderators: vec![],
            schedule,
            time: Some("06:00 PM".to_string()),
            timezone: Some("America/Chicago".to_string()),
            default_capacity: 0,
            default_location: Some("Library".to_string()),
        }
    }

    /// ## Summary
    /// A group meeting every week on `weekday` (0 = Sunday).
    #[must_use]
    pub fn weekly_group(id: u128, weekday: u8) -> Group {
        group_with_schedule(
            id,
            Some(serde_json::json!({
                "frequency": "weekly",
                "days": [{ "day": weekday }],
            })),
            3,
        )
    }
}
