//! Guardian session gate.
//!
//! Guardian access is a separate credential axis from student accounts: it
//! never looks at roles or subscriptions, and a request is checked by either
//! this gate or [`AccessGate`](super::AccessGate), never both.

use crate::config::GuardianSettings;
use crate::models::{AccessDecision, AllowReason, DenyReason, GuardianLink, GuardianSession};
use chrono::{DateTime, Utc};

/// Result of a guardian check: the linked record on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardianAccess {
    Granted(GuardianLink),
    Denied(AccessDecision),
}

impl GuardianAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardianAccess::Granted(_))
    }

    /// The equivalent access decision, for logs and metrics.
    pub fn decision(&self) -> AccessDecision {
        match self {
            GuardianAccess::Granted(_) => AccessDecision::allow(AllowReason::Guardian),
            GuardianAccess::Denied(decision) => decision.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardianAccessGate {
    login_path: String,
}

impl GuardianAccessGate {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn from_settings(settings: &GuardianSettings) -> Self {
        Self::new(settings.login_path.clone())
    }

    /// Validate a looked-up session and its link.
    ///
    /// A missing cookie and a missing row are both passed as `session: None`.
    /// Expired sessions are denied exactly like missing ones; they are left in
    /// place for housekeeping to remove.
    pub fn evaluate(
        &self,
        session: Option<&GuardianSession>,
        link: Option<GuardianLink>,
        now: DateTime<Utc>,
    ) -> GuardianAccess {
        let Some(session) = session.filter(|s| s.is_live(now)) else {
            return self.denied();
        };

        match link {
            Some(link) if link.id == session.guardian_link_id => GuardianAccess::Granted(link),
            _ => self.denied(),
        }
    }

    fn denied(&self) -> GuardianAccess {
        GuardianAccess::Denied(AccessDecision::deny(
            DenyReason::ExpiredGuardianSession,
            &self.login_path,
        ))
    }
}
