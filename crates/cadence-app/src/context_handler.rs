use salvo::async_trait;

use crate::error::AppResult;
use cadence_core::error::CoreError;
use cadence_service::ServiceContext;

/// Makes the engine's store and notifier available to every handler.
pub struct ServiceContextHandler {
    pub ctx: ServiceContext,
}

#[async_trait]
impl salvo::Handler for ServiceContextHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.ctx.clone());
    }
}

/// ## Summary
/// Retrieves the service context from the depot.
///
/// ## Errors
/// Returns an error if the service context is not found in the depot.
pub fn get_context_from_depot(depot: &salvo::Depot) -> AppResult<ServiceContext> {
    depot
        .obtain::<ServiceContext>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Service context not found in depot").into())
}
