//! Subscription gate for protected content.

use crate::config::AccessSettings;
use crate::models::{AccessDecision, AllowReason, DenyReason, Entitlement, Identity, Role};

/// Literal path prefixes that require a passing access decision.
///
/// Matching is a plain string prefix test: `/practice` covers
/// `/practice/42` and also `/practice-exams`.
#[derive(Debug, Clone, Default)]
pub struct ProtectedPaths {
    prefixes: Vec<String>,
}

impl ProtectedPaths {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Pure access policy. Callers fetch identity and entitlement first; this
/// type performs no I/O and cannot fail.
#[derive(Debug, Clone)]
pub struct AccessGate {
    protected: ProtectedPaths,
    login_path: String,
    pricing_path: String,
    verify_email_path: Option<String>,
}

impl AccessGate {
    pub fn new(
        protected: ProtectedPaths,
        login_path: impl Into<String>,
        pricing_path: impl Into<String>,
    ) -> Self {
        Self {
            protected,
            login_path: login_path.into(),
            pricing_path: pricing_path.into(),
            verify_email_path: None,
        }
    }

    /// Require a confirmed email for non-admin access, redirecting
    /// unconfirmed accounts to `verify_email_path`.
    pub fn with_email_confirmation(mut self, verify_email_path: impl Into<String>) -> Self {
        self.verify_email_path = Some(verify_email_path.into());
        self
    }

    pub fn from_settings(settings: &AccessSettings) -> Self {
        let gate = Self::new(
            ProtectedPaths::new(settings.protected_prefixes.iter().cloned()),
            settings.login_path.clone(),
            settings.pricing_path.clone(),
        );

        if settings.require_confirmed_email {
            gate.with_email_confirmation(settings.verify_email_path.clone())
        } else {
            gate
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.is_protected(path)
    }

    pub fn protected_paths(&self) -> &ProtectedPaths {
        &self.protected
    }

    /// Decide whether `path` may be served. First matching rule wins:
    ///
    /// 1. unprotected path: allowed
    /// 2. no identity: login
    /// 3. admin: allowed
    /// 4. unconfirmed email, when confirmation is required: verify-email
    /// 5. access override: allowed
    /// 6. active subscription: allowed
    /// 7. anything else, including a missing profile row: pricing
    pub fn evaluate(
        &self,
        path: &str,
        identity: Option<&Identity>,
        entitlement: Option<&Entitlement>,
    ) -> AccessDecision {
        if !self.is_protected(path) {
            return AccessDecision::allow(AllowReason::Unprotected);
        }

        let Some(identity) = identity else {
            return AccessDecision::deny(DenyReason::Unauthenticated, &self.login_path);
        };

        // A profile row may not exist yet right after sign-up.
        let Some(entitlement) = entitlement else {
            return self.not_entitled();
        };

        if entitlement.role == Role::Admin {
            return AccessDecision::allow(AllowReason::Admin);
        }

        if let Some(verify_email_path) = &self.verify_email_path {
            if !identity.is_email_confirmed() {
                return AccessDecision::deny(DenyReason::UnconfirmedEmail, verify_email_path);
            }
        }

        if entitlement.access_override {
            return AccessDecision::allow(AllowReason::AccessOverride);
        }

        if entitlement.is_subscribed {
            return AccessDecision::allow(AllowReason::Subscribed);
        }

        self.not_entitled()
    }

    fn not_entitled(&self) -> AccessDecision {
        AccessDecision::deny(DenyReason::NotEntitled, &self.pricing_path)
    }
}
