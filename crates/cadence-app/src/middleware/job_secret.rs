use salvo::Depot;

use cadence_core::constants::JOB_SECRET_HEADER;

use crate::config::get_jobs_config_from_depot;
use crate::error::{AppError, AppResult};

/// Rejects requests that do not carry the configured job secret.
pub struct JobSecretGuard;

fn secrets_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

fn check_secret(req: &salvo::Request, depot: &Depot) -> AppResult<()> {
    let jobs = get_jobs_config_from_depot(depot)?;
    let presented = req.header::<String>(JOB_SECRET_HEADER).unwrap_or_default();

    if jobs.secret.is_empty() || !secrets_match(presented.as_bytes(), jobs.secret.as_bytes())
    {
        return Err(AppError::Unauthorized("invalid job secret".to_string()));
    }
    Ok(())
}

#[salvo::async_trait]
impl salvo::Handler for JobSecretGuard {
    #[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        if let Err(err) = check_secret(req, depot) {
            tracing::warn!("Rejected job trigger");
            err.render(res);
            ctrl.skip_rest();
        }
    }
}
