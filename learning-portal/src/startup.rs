//! Application startup and lifecycle management.

use crate::config::Settings;
use crate::gate::{AccessGate, GuardianAccessGate};
use crate::handlers::{
    app::{health_check, index, metrics_handler, readiness_check},
    content::{api_progress, mastery, practice, practice_question, progress},
    guardian::{guardian_dashboard, guardian_login, guardian_logout},
};
use crate::middleware::{access_gate_middleware, guardian_gate_middleware, http_metrics_middleware};
use crate::services::{init_metrics, AccessControl, JwtIdentityResolver, PgEntitlementStore};
use crate::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::{security_headers_middleware, ApiPrefix},
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the HTTP router.
///
/// The access gate runs once for every route; it lets unprotected paths
/// through without resolving an identity. Guardian routes get their own gate
/// and are not listed as protected prefixes.
pub fn build_router(state: AppState) -> Router {
    let api_prefix = ApiPrefix::new(&state.access_settings.api_prefix);

    let guardian_routes = Router::new()
        .route("/guardian/dashboard", get(guardian_dashboard))
        .route_layer(from_fn_with_state(state.clone(), guardian_gate_middleware));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/practice", get(practice))
        .route("/practice/:question_id", get(practice_question))
        .route("/progress", get(progress))
        .route("/mastery", get(mastery))
        .route("/api/progress", get(api_progress))
        .route("/guardian/login", get(guardian_login))
        .route("/guardian/logout", post(guardian_logout))
        .merge(guardian_routes)
        .layer(from_fn_with_state(state.clone(), access_gate_middleware))
        .layer(from_fn_with_state(api_prefix, security_headers_middleware))
        .layer(from_fn(http_metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Wire the gates to the Postgres store and the JWT resolver.
pub fn build_state(settings: &Settings, store: PgEntitlementStore) -> AppState {
    let access = AccessControl::new(
        Arc::new(JwtIdentityResolver::new(&settings.auth)),
        Arc::new(store),
        AccessGate::from_settings(&settings.access),
        GuardianAccessGate::from_settings(&settings.guardian),
    );

    AppState::new(
        access,
        settings.access.clone(),
        settings.guardian.clone(),
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        init_metrics();

        let store = PgEntitlementStore::connect(&settings.database)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;

        let state = build_state(&settings, store);

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, addr = %address, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            protected_prefixes = ?state.access.gate().protected_paths().prefixes(),
            "Learning portal listener bound"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "learning-portal",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
