/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const JOBS_ROUTE_COMPONENT: &str = "jobs";
pub const JOBS_ROUTE_PREFIX: &str = const_str::concat!(API_ROUTE_PREFIX, "/", JOBS_ROUTE_COMPONENT);

pub const EVENTS_ROUTE_COMPONENT: &str = "events";
pub const EVENTS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", EVENTS_ROUTE_COMPONENT);

/// Shared secret presented by the external timer that triggers regeneration.
pub const JOB_SECRET_HEADER: &str = "x-cadence-job-secret";

/// Identity of the caller, set by the authenticating proxy in front of the server.
pub const USER_ID_HEADER: &str = "x-cadence-user";
