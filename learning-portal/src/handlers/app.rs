use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::services::get_metrics;
use crate::AppState;

pub async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "learning-portal",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.access.store().health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Health check failed - database unavailable");
        AppError::ServiceUnavailable
    })?;

    tracing::debug!("Health check passed");
    Ok(Json(json!({
        "status": "ok",
        "service": "learning-portal",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Readiness check endpoint for K8s readiness probes.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.access.store().health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(StatusCode::OK)
}

/// Metrics endpoint for Prometheus scraping.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
