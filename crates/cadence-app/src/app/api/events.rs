use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;
use uuid::Uuid;

use cadence_core::constants::EVENTS_ROUTE_COMPONENT;
use cadence_core::types::EventId;
use cadence_db::Event;
use cadence_service::{RsvpRequest, ServiceError, rsvp};

use crate::context_handler::get_context_from_depot;
use crate::error::{AppError, AppResult};
use crate::middleware::identity::{IdentityMiddleware, get_caller_from_depot};

/// ## Summary
/// RSVP request payload
#[derive(Debug, Deserialize)]
pub struct RsvpBody {
    pub status: String,
}

fn event_id_param(req: &Request) -> AppResult<EventId> {
    req.param::<String>("event_id")
        .and_then(|raw| Uuid::parse_str(&raw).ok())
        .ok_or_else(|| AppError::BadRequest("event id must be a UUID".to_string()))
}

async fn load_visible_event(req: &Request, depot: &Depot) -> AppResult<Event> {
    let ctx = get_context_from_depot(depot)?;
    let caller = get_caller_from_depot(depot)?;
    let event_id = event_id_param(req)?;

    let event = ctx
        .store
        .get_event(event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event {event_id}")))?;

    if !event.roster.members.contains(&caller) {
        return Err(ServiceError::Forbidden(format!(
            "user {caller} is not a member of this event"
        ))
        .into());
    }
    Ok(event)
}

async fn submit_rsvp(req: &mut Request, depot: &Depot) -> AppResult<Event> {
    let ctx = get_context_from_depot(depot)?;
    let caller = get_caller_from_depot(depot)?;
    let event_id = event_id_param(req)?;

    let body: RsvpBody = req.parse_json().await.map_err(|err| {
        tracing::debug!(error = ?err, "Failed to parse RSVP body");
        AppError::BadRequest("Invalid request body".to_string())
    })?;
    let requested: RsvpRequest = body.status.parse()?;

    Ok(rsvp::submit(&ctx, event_id, caller, requested).await?)
}

/// ## Summary
/// GET /api/events/{event_id} - Returns an event with its roster.
///
/// ## Errors
/// Returns HTTP 401 if the caller header is missing
/// Returns HTTP 403 if the caller is not on the event's roster
/// Returns HTTP 404 if the event does not exist
#[handler]
async fn get_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match load_visible_event(req, depot).await {
        Ok(event) => res.render(Json(event)),
        Err(err) => err.render(res),
    }
}

/// ## Summary
/// POST /api/events/{event_id}/rsvp - Records the caller's RSVP.
///
/// The body is `{ "status": "in" | "out" }`. Responds with the updated event.
///
/// ## Side Effects
/// - Moves the caller between roster lists
/// - Promotes waitlisted users when the caller gives up a seat
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, an unknown status or a cancelled event
/// Returns HTTP 401 if the caller header is missing
/// Returns HTTP 403 if the caller is not on the event's roster
/// Returns HTTP 404 if the event does not exist
/// Returns HTTP 409 if concurrent writers kept winning
#[handler]
async fn post_rsvp(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match submit_rsvp(req, depot).await {
        Ok(event) => res.render(Json(event)),
        Err(err) => err.render(res),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EVENTS_ROUTE_COMPONENT)
        .hoop(IdentityMiddleware)
        .push(
            Router::with_path("{event_id}")
                .get(get_event)
                .push(Router::with_path("rsvp").post(post_rsvp)),
        )
}
