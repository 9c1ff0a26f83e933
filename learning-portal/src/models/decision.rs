//! Access decision model.

use serde::Serialize;

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    Unprotected,
    Admin,
    AccessOverride,
    Subscribed,
    Guardian,
}

impl AllowReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowReason::Unprotected => "unprotected",
            AllowReason::Admin => "admin",
            AllowReason::AccessOverride => "access_override",
            AllowReason::Subscribed => "subscribed",
            AllowReason::Guardian => "guardian",
        }
    }
}

/// Why a request was turned away. These are expected outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    UnconfirmedEmail,
    NotEntitled,
    ExpiredGuardianSession,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::UnconfirmedEmail => "unconfirmed_email",
            DenyReason::NotEntitled => "not_entitled",
            DenyReason::ExpiredGuardianSession => "expired_guardian_session",
        }
    }

    /// Denials that a sign-in can fix. Their redirects carry the original
    /// target so the login flow can return there.
    pub fn wants_login(&self) -> bool {
        matches!(
            self,
            DenyReason::Unauthenticated | DenyReason::ExpiredGuardianSession
        )
    }
}

/// Outcome of a gate evaluation. Computed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed {
        reason: AllowReason,
    },
    Denied {
        reason: DenyReason,
        redirect_path: String,
    },
}

impl AccessDecision {
    pub fn allow(reason: AllowReason) -> Self {
        AccessDecision::Allowed { reason }
    }

    pub fn deny(reason: DenyReason, redirect_path: impl Into<String>) -> Self {
        AccessDecision::Denied {
            reason,
            redirect_path: redirect_path.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }

    /// Deny reason code; `None` when allowed.
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            AccessDecision::Allowed { .. } => None,
            AccessDecision::Denied { reason, .. } => Some(*reason),
        }
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            AccessDecision::Allowed { .. } => None,
            AccessDecision::Denied { redirect_path, .. } => Some(redirect_path),
        }
    }

    /// Label for logs and the decisions metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            AccessDecision::Allowed { reason } => reason.as_str(),
            AccessDecision::Denied { reason, .. } => reason.as_str(),
        }
    }
}
