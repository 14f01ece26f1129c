//! Persistence for groups and their meeting instances.
//!
//! The engine talks to storage only through [`store::ScheduleStore`]; the
//! PostgreSQL implementation lives under [`db`], and [`store::MemoryStore`]
//! backs tests and single-process setups.

pub mod db;
pub mod error;
pub mod model;
pub mod store;

pub use error::{DbError, DbResult};
pub use model::event::{Event, EventStatus, NewEvent, Roster};
pub use model::group::Group;
pub use store::{InsertOutcome, MemoryStore, ScheduleStore, pg::PgStore};
