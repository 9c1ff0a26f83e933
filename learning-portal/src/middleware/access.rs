use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use service_core::middleware::security_headers::is_under_prefix;

use crate::models::{AccessDecision, AllowReason, DenyReason, Entitlement, Identity};
use crate::AppState;

/// The single integration point for [`AccessGate`](crate::gate::AccessGate):
/// installed once on the whole router.
///
/// Allowed requests carry a [`Viewer`] in their extensions when an identity
/// was resolved. Backend failures become 5xx responses and the request never
/// reaches the handler.
pub async fn access_gate_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();
    let authorization = state.access.authorize(&path, req.headers()).await?;

    match authorization.decision {
        AccessDecision::Allowed { reason } => {
            if let Some(identity) = authorization.identity {
                req.extensions_mut().insert(Viewer {
                    identity,
                    entitlement: authorization.entitlement,
                    granted_by: reason,
                });
            }
            Ok(next.run(req).await)
        }
        denied => Ok(denial_response(
            &denied,
            req.uri(),
            &state.access_settings.api_prefix,
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct DeniedResponse {
    pub error: String,
    pub reason: DenyReason,
    pub redirect_path: String,
}

/// Turn a denial into the response the caller sees.
///
/// API callers get a JSON status (401 when signing in would help, 403
/// otherwise). Page requests are redirected; login redirects carry the
/// original target in `next`.
pub fn denial_response(decision: &AccessDecision, original: &Uri, api_prefix: &str) -> Response {
    let AccessDecision::Denied {
        reason,
        redirect_path,
    } = decision
    else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    if is_under_prefix(original.path(), api_prefix) {
        let status = if reason.wants_login() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::FORBIDDEN
        };
        return (
            status,
            Json(DeniedResponse {
                error: "Access denied".to_string(),
                reason: *reason,
                redirect_path: redirect_path.clone(),
            }),
        )
            .into_response();
    }

    if reason.wants_login() {
        Redirect::to(&with_return_target(redirect_path, original)).into_response()
    } else {
        Redirect::to(redirect_path).into_response()
    }
}

fn with_return_target(redirect_path: &str, original: &Uri) -> String {
    let target = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| original.path());

    match serde_urlencoded::to_string([("next", target)]) {
        Ok(query) => {
            let separator = if redirect_path.contains('?') { '&' } else { '?' };
            format!("{}{}{}", redirect_path, separator, query)
        }
        Err(_) => redirect_path.to_string(),
    }
}

/// Signed-in caller on a route that passed the access gate.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub identity: Identity,
    pub entitlement: Option<Entitlement>,
    pub granted_by: AllowReason,
}

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Viewer>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Viewer missing from request extensions; is the route protected?"
            ))
        })
    }
}
