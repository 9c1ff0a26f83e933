use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use uuid::Uuid;

use crate::config::GuardianSettings;
use crate::models::GuardianContext;
use crate::AppState;

/// Placeholder for the guardian code entry page, which is served by the
/// login flow.
pub async fn guardian_login() -> &'static str {
    "Guardian login"
}

#[derive(Debug, Serialize)]
pub struct GuardianDashboard {
    pub link_id: Uuid,
    pub student_id: Uuid,
    pub label: Option<String>,
}

pub async fn guardian_dashboard(context: GuardianContext) -> Json<GuardianDashboard> {
    Json(GuardianDashboard {
        link_id: context.link.id,
        student_id: context.link.student_id,
        label: context.link.label,
    })
}

/// Clear the guardian cookie and drop the session row.
///
/// The cookie is cleared even if deleting the row fails.
pub async fn guardian_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let settings = &state.guardian_settings;

    if let Some(token) = jar
        .get(&settings.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
    {
        if let Err(e) = state.access.store().delete_guardian_session(&token).await {
            tracing::error!(error = %e, "Failed to delete guardian session during logout");
        } else {
            tracing::info!("Guardian session ended");
        }
    }

    let jar = jar.add(cleared_cookie(settings));
    (jar, Redirect::to(&settings.login_path))
}

fn cleared_cookie(settings: &GuardianSettings) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), String::new()))
        .path(settings.cookie_path.clone())
        .http_only(true)
        .secure(settings.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}
