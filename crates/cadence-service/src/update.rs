//! Optimistic read-modify-write of a single event.

use cadence_core::types::EventId;
use cadence_db::{Event, ScheduleStore};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Loads the event, applies `mutate` to a copy, and writes it back guarded by
/// the version that was read.
///
/// When a concurrent writer wins, the event is reloaded and `mutate` runs
/// again on the fresh copy, up to `max_retries` times. If `mutate` leaves the
/// event unchanged nothing is written.
///
/// ## Errors
/// Returns `ServiceError::NotFound` if the event does not exist, whatever
/// `mutate` returns, or `ServiceError::ConcurrencyConflict` once retries run out.
#[tracing::instrument(skip(store, mutate))]
pub async fn modify_event<T, F>(
    store: &dyn ScheduleStore,
    event_id: EventId,
    max_retries: u8,
    mut mutate: F,
) -> ServiceResult<(Event, T)>
where
    F: FnMut(&mut Event) -> ServiceResult<T> + Send,
    T: Send,
{
    for attempt in 0..=max_retries {
        let current = store
            .get_event(event_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("event {event_id}")))?;

        let mut next = current.clone();
        let output = mutate(&mut next)?;
        if next == current {
            return Ok((current, output));
        }

        if let Some(stored) = store.update_event_if_version(&next, current.version).await? {
            return Ok((stored, output));
        }

        tracing::debug!(
            attempt,
            version = current.version,
            "Event changed concurrently, retrying"
        );
    }

    tracing::warn!(max_retries, "Gave up after repeated version conflicts");
    Err(ServiceError::ConcurrencyConflict(format!(
        "event {event_id} kept changing"
    )))
}
