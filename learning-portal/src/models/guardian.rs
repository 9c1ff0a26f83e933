//! Guardian session and link models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Code-based guardian session, keyed by the opaque cookie token.
///
/// Created by the guardian login flow; the gate only validates expiry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GuardianSession {
    pub session_id: String,
    pub guardian_link_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl GuardianSession {
    /// A session is live up to and including `expires_at`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Read-only link between a guardian code and one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct GuardianLink {
    pub id: Uuid,
    pub student_id: Uuid,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request extension attached after a passing guardian check.
#[derive(Debug, Clone, Serialize)]
pub struct GuardianContext {
    pub link: GuardianLink,
}
