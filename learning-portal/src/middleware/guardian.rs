use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use service_core::error::AppError;

use crate::gate::GuardianAccess;
use crate::middleware::access::denial_response;
use crate::models::GuardianContext;
use crate::AppState;

/// Guardian session check for the guardian area.
///
/// Reads the session token from the guardian cookie and attaches a
/// [`GuardianContext`] on success. Never combined with the access gate on the
/// same route.
pub async fn guardian_gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(&state.guardian_settings.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    match state
        .access
        .authorize_guardian(token.as_deref(), Utc::now())
        .await?
    {
        GuardianAccess::Granted(link) => {
            req.extensions_mut().insert(GuardianContext { link });
            Ok(next.run(req).await)
        }
        GuardianAccess::Denied(decision) => Ok(denial_response(
            &decision,
            req.uri(),
            &state.access_settings.api_prefix,
        )),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for GuardianContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GuardianContext>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Guardian context missing from request extensions"
                ))
            })
    }
}
