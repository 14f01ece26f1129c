//! Job settings shared with request handlers.
//!
//! Only the `[jobs]` section is exposed to the HTTP layer: the trigger guard
//! compares against its secret and the trigger itself reads the concurrency.

use std::sync::Arc;

use salvo::{Depot, async_trait};

use cadence_core::config::JobsConfig;
use cadence_core::error::CoreError;

use crate::error::AppResult;

pub struct JobsConfigHandler {
    jobs: Arc<JobsConfig>,
}

impl JobsConfigHandler {
    #[must_use]
    pub fn new(jobs: JobsConfig) -> Self {
        Self {
            jobs: Arc::new(jobs),
        }
    }
}

#[async_trait]
impl salvo::Handler for JobsConfigHandler {
    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.jobs));
    }
}

/// ## Summary
/// The `[jobs]` settings injected by [`JobsConfigHandler`].
///
/// ## Errors
/// Returns an invariant violation if the router was built without the handler.
pub fn get_jobs_config_from_depot(depot: &Depot) -> AppResult<Arc<JobsConfig>> {
    depot
        .obtain::<Arc<JobsConfig>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Job settings not found in depot").into())
}
