mod events;
mod healthcheck;
mod jobs;

use salvo::Router;

pub use cadence_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, EVENTS_ROUTE_COMPONENT, EVENTS_ROUTE_PREFIX,
    JOBS_ROUTE_COMPONENT, JOBS_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router: health check, the regeneration trigger and
/// event RSVPs.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(healthcheck::routes())
        .push(jobs::routes())
        .push(events::routes())
}
