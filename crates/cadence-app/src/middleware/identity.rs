use salvo::Depot;
use uuid::Uuid;

use cadence_core::constants::USER_ID_HEADER;
use cadence_core::types::UserId;

use crate::error::{AppError, AppResult};

pub mod depot_keys {
    /// The caller's user id, as asserted by the authenticating proxy.
    pub const CALLER: &str = "cadence.caller";
}

/// ## Summary
/// Reads the caller's identity from the proxy header and stores it in the
/// depot under [`depot_keys::CALLER`].
///
/// ## Errors
/// Answers 401 if the header is missing and 400 if it is not a UUID.
pub struct IdentityMiddleware;

fn caller_from_header(req: &salvo::Request) -> AppResult<UserId> {
    let raw = req
        .header::<String>(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

    Uuid::parse_str(raw.trim())
        .map_err(|_err| AppError::BadRequest(format!("{USER_ID_HEADER} must be a UUID")))
}

#[salvo::async_trait]
impl salvo::Handler for IdentityMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        match caller_from_header(req) {
            Ok(user) => {
                tracing::trace!(%user, "Caller identified");
                depot.insert(depot_keys::CALLER, user);
            }
            Err(err) => {
                err.render(res);
                ctrl.skip_rest();
            }
        }
    }
}

/// ## Summary
/// Retrieves the caller stored by [`IdentityMiddleware`].
///
/// ## Errors
/// Returns `Unauthorized` if the middleware did not run for this request.
pub fn get_caller_from_depot(depot: &Depot) -> AppResult<UserId> {
    depot
        .get::<UserId>(depot_keys::CALLER)
        .copied()
        .map_err(|_err| AppError::Unauthorized("caller not identified".to_string()))
}
