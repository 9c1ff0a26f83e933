//! Protected content areas.
//!
//! Page rendering lives elsewhere; these loaders return the viewer context a
//! page needs once the access gate has let the request through.

use axum::{extract::Path, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::Viewer;
use crate::models::{AllowReason, Role};

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub area: &'static str,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub granted_by: AllowReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}

fn area(name: &'static str, viewer: Viewer, question_id: Option<String>) -> Json<AreaResponse> {
    Json(AreaResponse {
        area: name,
        user_id: viewer.identity.user_id,
        email: viewer.identity.email,
        role: viewer
            .entitlement
            .map(|e| e.role)
            .unwrap_or(Role::Student),
        granted_by: viewer.granted_by,
        question_id,
    })
}

pub async fn practice(viewer: Viewer) -> Json<AreaResponse> {
    area("practice", viewer, None)
}

pub async fn practice_question(
    Path(question_id): Path<String>,
    viewer: Viewer,
) -> Json<AreaResponse> {
    area("practice", viewer, Some(question_id))
}

pub async fn progress(viewer: Viewer) -> Json<AreaResponse> {
    area("progress", viewer, None)
}

pub async fn mastery(viewer: Viewer) -> Json<AreaResponse> {
    area("mastery", viewer, None)
}

pub async fn api_progress(viewer: Viewer) -> Json<AreaResponse> {
    area("progress", viewer, None)
}
