//! Postgres-backed entitlement store.

use crate::config::DatabaseSettings;
use crate::models::{Entitlement, GuardianLink, GuardianSession, ProfileRow};
use crate::services::metrics::STORE_QUERY_DURATION;
use crate::services::store::EntitlementStore;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgEntitlementStore {
    pool: PgPool,
}

impl PgEntitlementStore {
    /// Create a new database connection pool.
    #[instrument(skip(settings), fields(service = "learning-portal"))]
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AppError> {
        info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .connect(settings.url.expose_secret())
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }
}

#[async_trait]
impl EntitlementStore for PgEntitlementStore {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Entitlement>, AppError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["get_profile"])
            .start_timer();

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT role, is_subscribed, access_override
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get profile: {}", e)))?;

        timer.observe_duration();

        Ok(row.map(Entitlement::from))
    }

    #[instrument(skip(self, token))]
    async fn get_guardian_session(
        &self,
        token: &str,
    ) -> Result<Option<GuardianSession>, AppError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["get_guardian_session"])
            .start_timer();

        let session = sqlx::query_as::<_, GuardianSession>(
            r#"
            SELECT session_id, guardian_link_id, expires_at
            FROM guardian_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get guardian session: {}", e))
        })?;

        timer.observe_duration();

        Ok(session)
    }

    #[instrument(skip(self), fields(link_id = %link_id))]
    async fn get_guardian_link(&self, link_id: Uuid) -> Result<Option<GuardianLink>, AppError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["get_guardian_link"])
            .start_timer();

        let link = sqlx::query_as::<_, GuardianLink>(
            r#"
            SELECT id, student_id, label, created_at
            FROM guardian_links
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get guardian link: {}", e))
        })?;

        timer.observe_duration();

        Ok(link)
    }

    #[instrument(skip(self, token))]
    async fn delete_guardian_session(&self, token: &str) -> Result<(), AppError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["delete_guardian_session"])
            .start_timer();

        let result = sqlx::query("DELETE FROM guardian_sessions WHERE session_id = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete guardian session: {}",
                    e
                ))
            })?;

        timer.observe_duration();
        info!(rows = result.rows_affected(), "Guardian session deleted");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }
}
