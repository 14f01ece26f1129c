use chrono::Utc;
use salvo::{Depot, Response, Router, handler, writing::Json};

use cadence_core::constants::JOBS_ROUTE_COMPONENT;
use cadence_service::{EventRegenerationJob, RegenerationReport};

use crate::config::get_jobs_config_from_depot;
use crate::context_handler::get_context_from_depot;
use crate::error::AppResult;
use crate::middleware::job_secret::JobSecretGuard;

async fn run_regeneration(depot: &Depot) -> AppResult<RegenerationReport> {
    let ctx = get_context_from_depot(depot)?;
    let jobs = get_jobs_config_from_depot(depot)?;

    let job = EventRegenerationJob::new(ctx).with_concurrency(jobs.concurrency);
    Ok(job.run(Utc::now()).await?)
}

/// ## Summary
/// POST /api/jobs/regenerate - Runs one regeneration pass.
///
/// Responds with `{ deleted, regenerated, skipped, failures }`. Per-group
/// failures are reported in the body and do not fail the request.
///
/// ## Errors
/// Returns HTTP 401 without the job secret header (see [`JobSecretGuard`])
/// Returns HTTP 500 if the store cannot be read
#[handler]
async fn regenerate(depot: &mut Depot, res: &mut Response) {
    match run_regeneration(depot).await {
        Ok(report) => {
            tracing::info!(
                deleted = report.deleted,
                regenerated = report.regenerated,
                failures = report.failures.len(),
                "Regeneration triggered"
            );
            res.render(Json(report));
        }
        Err(err) => err.render(res),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(JOBS_ROUTE_COMPONENT)
        .hoop(JobSecretGuard)
        .push(Router::with_path("regenerate").post(regenerate))
}
