pub mod api;

use salvo::Router;

use cadence_core::config::Settings;
use cadence_service::ServiceContext;

use crate::config::JobsConfigHandler;
use crate::context_handler::ServiceContextHandler;

/// ## Summary
/// The full application router with its shared state attached.
#[must_use]
pub fn router(ctx: ServiceContext, settings: Settings) -> Router {
    Router::new()
        .hoop(ServiceContextHandler { ctx })
        .hoop(JobsConfigHandler::new(settings.jobs))
        .push(api::routes())
}
