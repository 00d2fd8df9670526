//! Authentication middleware and extractors for axum.
//!
//! - `auth_middleware` - validates Bearer tokens and injects the `Session`
//!   into request extensions
//! - `RequireAuth` - extractor that requires a session
//! - `OptionalAuth` - extractor for an optional session
//!
//! ```text
//! Request → auth_middleware → injects Session into extensions
//!                                      ↓
//!                  Handler → RequireAuth / OptionalAuth read from extensions
//! ```
//!
//! The middleware only sees the `SessionValidator` port, so the same code
//! runs against the JWT validator in production and the mock in tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::auth::{AuthError, Session};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type ValidatorState = Arc<dyn SessionValidator>;

/// Validates an `Authorization: Bearer <token>` header when present.
///
/// A request without the header continues anonymously; a request with a
/// token that fails validation is answered with 401 (503 when the
/// validator itself is unavailable).
pub async fn auth_middleware(
    State(validator): State<ValidatorState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match validator.validate(&token).await {
        Ok(session) => {
            tracing::debug!(user_id = %session.user_id(), "Bearer token accepted");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => {
            let (status, message) = match &e {
                AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
                AuthError::ServiceUnavailable(msg) => {
                    tracing::error!(error = %msg, "Auth service unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Authentication service unavailable",
                    )
                }
                _ => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            };

            (
                status,
                Json(serde_json::json!({
                    "error": message,
                    "code": "AUTH_ERROR"
                })),
            )
                .into_response()
        }
    }
}

/// Extractor that requires a validated session; 401 otherwise.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor for an optional session. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<Session>().cloned()))
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid authentication token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required",
                    "code": "UNAUTHENTICATED"
                })),
            )
                .into_response(),
        }
    }
}
