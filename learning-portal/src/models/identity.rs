//! Authenticated identity model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Caller identity resolved from the hosted auth session.
///
/// Resolved once per request and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}
