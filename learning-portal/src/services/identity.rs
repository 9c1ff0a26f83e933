//! Identity resolution from hosted-auth session tokens.

use crate::config::AuthSettings;
use crate::models::Identity;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Turns request credentials into an [`Identity`].
///
/// `Ok(None)` means "no valid session" and is a normal outcome. `Err` is
/// reserved for backend failures (an unreachable auth provider) and must
/// surface as a server error, not as a logged-out user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError>;
}

/// Claims carried by the hosted auth provider's access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Session subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Validates HS256 session tokens locally with the provider's shared secret.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    session_cookie: String,
}

impl JwtIdentityResolver {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[settings.audience.as_str()]);

        Self {
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.expose_secret().as_bytes()),
            validation,
            session_cookie: settings.session_cookie.clone(),
        }
    }

    /// Bearer header first, then the session cookie.
    fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        if let Some(token) = bearer {
            return Some(token.to_string());
        }

        CookieJar::from_headers(headers)
            .get(&self.session_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn decode_token(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| IdentityError::InvalidSubject(claims.sub))?;

        Ok(Identity {
            user_id,
            email: claims.email,
            email_confirmed_at: claims.email_confirmed_at,
        })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
        let Some(token) = self.extract_token(headers) else {
            return Ok(None);
        };

        match self.decode_token(&token) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable session token");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::Secret;

    const SECRET: &str = "unit-test-secret";

    fn resolver() -> JwtIdentityResolver {
        JwtIdentityResolver::new(&AuthSettings {
            jwt_secret: Secret::new(SECRET.to_string()),
            audience: "authenticated".to_string(),
            session_cookie: "sb-access-token".to_string(),
        })
    }

    fn claims(user_id: Uuid, exp: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: user_id.to_string(),
            email: "student@example.com".to_string(),
            email_confirmed_at: None,
            exp: exp.timestamp(),
            aud: Some("authenticated".to_string()),
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn resolves_identity_from_bearer_token() {
        let user_id = Uuid::new_v4();
        let token = sign(&claims(user_id, Utc::now() + Duration::hours(1)), SECRET);

        let identity = resolver().resolve(&bearer(&token)).await.unwrap().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "student@example.com");
        assert!(!identity.is_email_confirmed());
    }

    #[tokio::test]
    async fn resolves_identity_from_session_cookie() {
        let user_id = Uuid::new_v4();
        let mut session = claims(user_id, Utc::now() + Duration::hours(1));
        session.email_confirmed_at = Some(Utc::now() - Duration::days(2));
        let token = sign(&session, SECRET);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; sb-access-token={}", token).parse().unwrap(),
        );

        let identity = resolver().resolve(&headers).await.unwrap().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert!(identity.is_email_confirmed());
    }

    #[tokio::test]
    async fn no_credentials_resolve_to_none() {
        assert!(resolver().resolve(&HeaderMap::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_resolves_to_none() {
        let token = sign(
            &claims(Uuid::new_v4(), Utc::now() - Duration::hours(2)),
            SECRET,
        );
        assert!(resolver().resolve(&bearer(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_signature_resolves_to_none() {
        let token = sign(
            &claims(Uuid::new_v4(), Utc::now() + Duration::hours(1)),
            "someone-elses-secret",
        );
        assert!(resolver().resolve(&bearer(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_token_resolves_to_none() {
        assert!(resolver()
            .resolve(&bearer("not.a.jwt"))
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let mut session = claims(Uuid::new_v4(), Utc::now() + Duration::hours(1));
        session.sub = "service-role".to_string();
        let token = sign(&session, SECRET);

        let err = resolver().decode_token(&token).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidSubject(_)));
    }
}
