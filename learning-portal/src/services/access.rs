//! Request authorization: fetch, then decide.

use crate::gate::{AccessGate, GuardianAccess, GuardianAccessGate};
use crate::models::{AccessDecision, Entitlement, Identity};
use crate::services::identity::IdentityResolver;
use crate::services::metrics::{record_access_decision, record_access_error};
use crate::services::store::EntitlementStore;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

const ACCESS_GATE: &str = "access";
const GUARDIAN_GATE: &str = "guardian";

/// Decision plus whatever was resolved on the way, for handlers to reuse.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub decision: AccessDecision,
    pub identity: Option<Identity>,
    pub entitlement: Option<Entitlement>,
}

/// Owns the injected collaborators and both gates.
///
/// All I/O happens here; the gates only see the fetched rows. Backend
/// failures are returned as errors and never folded into a decision.
#[derive(Clone)]
pub struct AccessControl {
    identity: Arc<dyn IdentityResolver>,
    store: Arc<dyn EntitlementStore>,
    gate: AccessGate,
    guardian_gate: GuardianAccessGate,
}

impl AccessControl {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        store: Arc<dyn EntitlementStore>,
        gate: AccessGate,
        guardian_gate: GuardianAccessGate,
    ) -> Self {
        Self {
            identity,
            store,
            gate,
            guardian_gate,
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn store(&self) -> &Arc<dyn EntitlementStore> {
        &self.store
    }

    /// Authorize a request for `path`.
    ///
    /// Unprotected paths are allowed without touching the resolver or the
    /// store. The profile is fetched only once an identity is known.
    #[instrument(skip(self, headers))]
    pub async fn authorize(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Authorization, AppError> {
        if !self.gate.is_protected(path) {
            return Ok(Authorization {
                decision: self.gate.evaluate(path, None, None),
                identity: None,
                entitlement: None,
            });
        }

        let identity = self
            .identity
            .resolve(headers)
            .await
            .map_err(|e| backend_failure(ACCESS_GATE, e))?;

        let entitlement = match &identity {
            Some(identity) => self
                .store
                .get_profile(identity.user_id)
                .await
                .map_err(|e| backend_failure(ACCESS_GATE, e))?,
            None => None,
        };

        let decision = self
            .gate
            .evaluate(path, identity.as_ref(), entitlement.as_ref());

        record_access_decision(ACCESS_GATE, decision.outcome());
        tracing::info!(
            path = %path,
            user_id = ?identity.as_ref().map(|i| i.user_id),
            outcome = decision.outcome(),
            allowed = decision.is_allowed(),
            "Access decision"
        );

        Ok(Authorization {
            decision,
            identity,
            entitlement,
        })
    }

    /// Authorize a guardian request carrying `token` from the session cookie.
    ///
    /// The link is only fetched for a live session.
    #[instrument(skip(self, token), fields(has_token = token.is_some()))]
    pub async fn authorize_guardian(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<GuardianAccess, AppError> {
        let session = match token {
            Some(token) => self
                .store
                .get_guardian_session(token)
                .await
                .map_err(|e| backend_failure(GUARDIAN_GATE, e))?,
            None => None,
        };

        let link = match session.as_ref().filter(|s| s.is_live(now)) {
            Some(session) => self
                .store
                .get_guardian_link(session.guardian_link_id)
                .await
                .map_err(|e| backend_failure(GUARDIAN_GATE, e))?,
            None => None,
        };

        let access = self.guardian_gate.evaluate(session.as_ref(), link, now);

        match &access {
            GuardianAccess::Granted(link) => {
                tracing::info!(link_id = %link.id, "Guardian access granted");
            }
            GuardianAccess::Denied(_) => {
                tracing::info!(
                    session_found = session.is_some(),
                    "Guardian access denied"
                );
            }
        }
        record_access_decision(GUARDIAN_GATE, access.decision().outcome());

        Ok(access)
    }
}

fn backend_failure(gate: &str, err: AppError) -> AppError {
    record_access_error(gate, err.kind());
    tracing::error!(gate = gate, error = %err, "Backend failure while authorizing request");
    err
}
