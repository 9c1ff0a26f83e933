//! Test helpers for learning-portal integration tests.
//!
//! Routers are driven in-process with `oneshot`; the entitlement store is an
//! in-memory fake with a switch that makes every query fail.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use learning_portal::{
    config::{AccessSettings, AuthSettings, GuardianSettings},
    gate::{AccessGate, GuardianAccessGate},
    models::{Entitlement, GuardianLink, GuardianSession, Identity},
    services::{AccessControl, EntitlementStore, IdentityResolver, JwtIdentityResolver, SessionClaims},
    startup::build_router,
    AppState,
};
use secrecy::Secret;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const GUARDIAN_COOKIE: &str = "guardian_session";

/// In-memory entitlement store.
#[derive(Default)]
pub struct FakeStore {
    profiles: RwLock<HashMap<Uuid, Entitlement>>,
    sessions: RwLock<HashMap<String, GuardianSession>>,
    links: RwLock<HashMap<Uuid, GuardianLink>>,
    failing: AtomicBool,
}

impl FakeStore {
    pub async fn put_profile(&self, user_id: Uuid, entitlement: Entitlement) {
        self.profiles.write().await.insert(user_id, entitlement);
    }

    /// Insert a link and a session for it; returns the link.
    pub async fn put_guardian_session(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> GuardianLink {
        let link = GuardianLink {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            label: Some("Mum".to_string()),
            created_at: Utc::now() - Duration::days(7),
        };
        self.links.write().await.insert(link.id, link.clone());
        self.sessions.write().await.insert(
            token.to_string(),
            GuardianSession {
                session_id: token.to_string(),
                guardian_link_id: link.id,
                expires_at,
            },
        );
        link
    }

    pub async fn remove_link(&self, link_id: Uuid) {
        self.links.write().await.remove(&link_id);
    }

    pub async fn has_session(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(token)
    }

    pub fn fail_queries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "connection refused"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EntitlementStore for FakeStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Entitlement>, AppError> {
        self.check()?;
        Ok(self.profiles.read().await.get(&user_id).copied())
    }

    async fn get_guardian_session(
        &self,
        token: &str,
    ) -> Result<Option<GuardianSession>, AppError> {
        self.check()?;
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn get_guardian_link(&self, link_id: Uuid) -> Result<Option<GuardianLink>, AppError> {
        self.check()?;
        Ok(self.links.read().await.get(&link_id).cloned())
    }

    async fn delete_guardian_session(&self, token: &str) -> Result<(), AppError> {
        self.check()?;
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Real JWT resolver that counts how often it is consulted and can be
/// switched into behaving like an unreachable auth provider.
pub struct CountingResolver {
    inner: JwtIdentityResolver,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityResolver for CountingResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "auth provider unreachable"
            )));
        }
        self.inner.resolve(headers).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeStore>,
    pub resolver: Arc<CountingResolver>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_access_settings(AccessSettings::default()).await
    }

    pub async fn with_access_settings(access_settings: AccessSettings) -> Self {
        let auth = AuthSettings {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            audience: "authenticated".to_string(),
            session_cookie: "sb-access-token".to_string(),
        };
        let guardian_settings = GuardianSettings::default();

        let store = Arc::new(FakeStore::default());
        let resolver = Arc::new(CountingResolver {
            inner: JwtIdentityResolver::new(&auth),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        });

        let access = AccessControl::new(
            resolver.clone(),
            store.clone(),
            AccessGate::from_settings(&access_settings),
            GuardianAccessGate::from_settings(&guardian_settings),
        );
        let state = AppState::new(access, access_settings, guardian_settings);

        Self {
            router: build_router(state),
            store,
            resolver,
        }
    }

    /// Register a user with the given entitlement; returns a session token.
    pub async fn sign_up(&self, entitlement: Option<Entitlement>) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        if let Some(entitlement) = entitlement {
            self.store.put_profile(user_id, entitlement).await;
        }
        (user_id, session_token(user_id, true))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn session_token(user_id: Uuid, email_confirmed: bool) -> String {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", &user_id.simple().to_string()[..8]),
        email_confirmed_at: email_confirmed.then(|| Utc::now() - Duration::days(1)),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        aud: Some("authenticated".to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
