//! In-process trigger for the regeneration job, for deployments without an
//! external timer.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use cadence_service::EventRegenerationJob;

/// ## Summary
/// Runs `job` every `period`, starting immediately.
///
/// Returns `None` for a zero period. Ticks that fall behind are skipped, so
/// passes never pile up. A failed pass is logged and the loop continues.
#[must_use]
pub fn spawn_regeneration_loop(
    job: EventRegenerationJob,
    period: Duration,
) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        tracing::warn!("Regeneration interval is zero, not scheduling the job");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match job.run(Utc::now()).await {
                Ok(report) => tracing::info!(
                    deleted = report.deleted,
                    regenerated = report.regenerated,
                    skipped = report.skipped,
                    failures = report.failures.len(),
                    "Scheduled regeneration finished"
                ),
                Err(e) => tracing::error!(error = %e, "Scheduled regeneration failed"),
            }
        }
    }))
}
