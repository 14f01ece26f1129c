//! Turns group schedules into concrete upcoming events.

use std::collections::BTreeSet;

use cadence_core::types::GroupId;
use cadence_db::{EventStatus, Group, InsertOutcome, NewEvent, Roster};
use cadence_rule::{ClockTime, Occurrence, RecurrenceRule, RuleError, next_occurrence, zone};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;

use crate::context::ServiceContext;
use crate::error::ServiceResult;
use crate::notify::Notification;

/// Default number of groups regenerated at the same time.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub group: GroupId,
    pub error: String,
}

/// Summary of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerationReport {
    /// Expired generated events removed.
    pub deleted: usize,
    /// New events created.
    pub regenerated: usize,
    /// Groups whose next slot turned out to be covered already, either by a
    /// generated event or by one that was cancelled or edited.
    pub skipped: usize,
    pub failures: Vec<GroupFailure>,
}

/// ## Summary
/// Parses a group's persisted schedule into the calculator's inputs.
///
/// ## Errors
/// Returns `RuleError` if the schedule, time or timezone is malformed or a
/// scheduled group lacks a meeting time or zone.
pub fn schedule_inputs(
    group: &Group,
) -> Result<Option<(RecurrenceRule, ClockTime, chrono_tz::Tz)>, RuleError> {
    let Some(schedule) = &group.schedule else {
        return Ok(None);
    };

    let rule = RecurrenceRule::from_json(schedule.clone())?;
    let time = group
        .time
        .as_deref()
        .ok_or_else(|| RuleError::InvalidRule("scheduled group has no meeting time".to_string()))?
        .parse::<ClockTime>()?;
    let zone = zone::resolve(group.timezone.as_deref().ok_or_else(|| {
        RuleError::InvalidRule("scheduled group has no timezone".to_string())
    })?)?;

    Ok(Some((rule, time, zone)))
}

/// ## Summary
/// The generated event a group should have for `occurrence`.
///
/// Every entitled user starts undecided; capacity and location come from the
/// group defaults.
#[must_use]
pub fn generated_event(group: &Group, occurrence: &Occurrence) -> NewEvent {
    NewEvent {
        group_id: group.id,
        name: group.name.clone(),
        date: occurrence.date,
        time: occurrence.time,
        timezone: occurrence.timezone.name().to_string(),
        starts_at: occurrence.starts_at,
        location: group.default_location.clone(),
        status: EventStatus::Scheduled,
        is_override: false,
        capacity: group.default_capacity,
        roster: Roster::seeded(group.entitled_users()),
    }
}

/// Deletes expired generated events and makes sure every scheduled group has
/// exactly one upcoming generated event.
#[derive(Clone)]
pub struct EventRegenerationJob {
    ctx: ServiceContext,
    concurrency: usize,
}

impl EventRegenerationJob {
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// ## Summary
    /// Runs one regeneration pass as of `now`.
    ///
    /// Groups are processed independently: a malformed schedule or a store
    /// error for one group is recorded in `failures` and the rest continue.
    /// Running twice with the same `now` creates nothing the second time.
    ///
    /// ## Side Effects
    /// Deletes expired generated events, inserts new ones and emits
    /// `EventScheduled` for each.
    ///
    /// ## Errors
    /// Returns an error only if the expired events or the idle groups cannot
    /// be loaded, or the batch delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> ServiceResult<RegenerationReport> {
        let store = self.ctx.store.as_ref();

        let expired = store.list_expired_generated_events(now).await?;
        let touched: BTreeSet<GroupId> = expired.iter().map(|event| event.group_id).collect();
        let ids: Vec<_> = expired.iter().map(|event| event.id).collect();
        let deleted = store.delete_generated_events(&ids).await?;
        tracing::debug!(deleted, touched = touched.len(), "Removed expired events");

        let groups = store.list_idle_scheduled_groups(now).await?;
        tracing::debug!(count = groups.len(), "Groups needing an event");

        let results: Vec<(GroupId, ServiceResult<Option<InsertOutcome>>)> = futures::stream::iter(groups)
            .map(|group| async move {
                let outcome = self.regenerate_group(&group, now).await;
                (group.id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = RegenerationReport {
            deleted,
            ..RegenerationReport::default()
        };

        for (group, result) in results {
            match result {
                Ok(Some(InsertOutcome::Created(event))) => {
                    report.regenerated += 1;
                    self.ctx.notifier.notify(Notification::EventScheduled {
                        group,
                        event: event.id,
                        date: event.date,
                        starts_at: event.starts_at,
                    });
                }
                Ok(Some(InsertOutcome::AlreadyPresent)) => {
                    tracing::debug!(%group, "Group already has an upcoming event");
                    report.skipped += 1;
                }
                Ok(Some(InsertOutcome::SlotClaimed)) => {
                    tracing::debug!(%group, "Next slot is held by a cancelled or edited event");
                    report.skipped += 1;
                }
                Ok(None) => {
                    tracing::debug!(%group, "Group lost its schedule before regeneration");
                }
                Err(error) => {
                    tracing::warn!(%group, %error, "Failed to regenerate group");
                    report.failures.push(GroupFailure {
                        group,
                        error: error.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by_key(|failure| failure.group);

        tracing::info!(
            deleted = report.deleted,
            regenerated = report.regenerated,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Regeneration run finished"
        );
        Ok(report)
    }

    /// ## Summary
    /// Stores the next generated event for one group. Returns `None` when the
    /// group has no schedule to expand.
    #[tracing::instrument(skip(self, group), fields(group_id = %group.id))]
    async fn regenerate_group(
        &self,
        group: &Group,
        now: DateTime<Utc>,
    ) -> ServiceResult<Option<InsertOutcome>> {
        let Some((rule, time, zone)) = schedule_inputs(group)? else {
            return Ok(None);
        };

        let occurrence = next_occurrence(&rule, now, time, zone)?;
        let event = generated_event(group, &occurrence);

        Ok(Some(
            self.ctx
                .store
                .insert_generated_event_if_absent(event, now)
                .await?,
        ))
    }
}
