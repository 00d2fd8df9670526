//! Bearer-token validation for Supabase-issued JWTs.
//!
//! GoTrue signs access tokens with the project's JWT secret (HS256) and an
//! audience of `authenticated`. This adapter implements the
//! `SessionValidator` port by checking signature, audience and expiry,
//! then mapping the claims onto a domain `Session`.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::auth::{AuthError, Session};
use crate::domain::foundation::UserId;
use crate::ports::SessionValidator;

/// Audience GoTrue puts on tokens for signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

#[derive(Debug, Deserialize)]
struct SupabaseClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
}

/// HS256 validator keyed by the project JWT secret.
pub struct JwtSessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<SupabaseClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                other => {
                    tracing::debug!(error = ?other, "Rejected bearer token");
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let user_id = UserId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let mut session = Session::new(user_id, claims.email, token);
        session.expires_at = Utc.timestamp_opt(claims.exp, 0).single();
        Ok(session)
    }
}
