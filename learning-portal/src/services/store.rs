//! Entitlement store contract.

use crate::models::{Entitlement, GuardianLink, GuardianSession};
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

/// Read access to profile and guardian rows in the hosted database.
///
/// Every lookup distinguishes "no such row" (`Ok(None)`) from a failed query
/// (`Err`). Callers rely on that split to tell a not-entitled user apart from
/// a database outage.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Entitlement>, AppError>;

    async fn get_guardian_session(&self, token: &str)
        -> Result<Option<GuardianSession>, AppError>;

    async fn get_guardian_link(&self, link_id: Uuid) -> Result<Option<GuardianLink>, AppError>;

    /// Remove a guardian session on explicit logout. Not used by the gates.
    async fn delete_guardian_session(&self, token: &str) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
