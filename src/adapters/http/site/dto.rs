//! Request and response bodies for the site endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::View;
use crate::domain::auth::{AuthState, GuardState, Role, Session};
use crate::domain::engagement::NewComment;
use crate::ports::Credentials;

/// Aggregated auth state for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AuthStateResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub guard: GuardState,
}

impl AuthStateResponse {
    pub fn new(state: &AuthState, guard: GuardState) -> Self {
        let session = state.session.as_deref();
        Self {
            authenticated: session.is_some(),
            user_id: session.map(|s| s.user_id().to_string()),
            email: session.and_then(|s| s.email().map(str::to_string)),
            role: state.role,
            guard,
        }
    }
}

/// The view a path resolves to for the caller's role.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingResponse {
    pub view: View,
    pub role: Role,
}

// ────────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/auth/sign-in` and `POST /api/auth/sign-up`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl From<CredentialsRequest> for Credentials {
    fn from(request: CredentialsRequest) -> Self {
        Credentials::new(request.email.trim(), request.password)
    }
}

/// Tokens issued on sign-in or sign-up, with the role they resolve to.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

impl SessionResponse {
    pub fn new(session: &Session, role: Role) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
            user_id: session.user_id().to_string(),
            email: session.email().map(str::to_string),
            role,
        }
    }
}

/// Sign-up accepted, session withheld until the email is confirmed.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationPendingResponse {
    pub confirmation_required: bool,
}

// ────────────────────────────────────────────────────────────────────────────────
// Engagement
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LikeStatusResponse {
    pub post_id: String,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub status: String,
}

impl From<NewComment> for CommentResponse {
    fn from(comment: NewComment) -> Self {
        Self {
            post_id: comment.post_id.to_string(),
            author_id: comment.author_id.to_string(),
            content: comment.content,
            status: comment.status.to_string(),
        }
    }
}

/// Error body shared by the site endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use secrecy::ExposeSecret;
    use std::sync::Arc;

    #[test]
    fn anonymous_state_omits_identity() {
        let mut state = AuthState::initial();
        state.session_loading = false;
        state.role_loading = false;

        let json = serde_json::to_value(AuthStateResponse::new(
            &state,
            GuardState::Unauthenticated,
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "authenticated": false,
                "role": "anonymous",
                "guard": "unauthenticated"
            })
        );
    }

    #[test]
    fn session_response_carries_tokens_and_role() {
        let session = Session::new(UserId::new("u1").unwrap(), None, "jwt")
            .with_refresh_token("refresh");

        let json = serde_json::to_value(SessionResponse::new(&session, Role::User)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "jwt",
                "refresh_token": "refresh",
                "user_id": "u1",
                "role": "user"
            })
        );
    }

    #[test]
    fn credentials_request_trims_email_only() {
        let request: CredentialsRequest =
            serde_json::from_str(r#"{"email":" a@example.com ","password":" pw "}"#).unwrap();
        let credentials = Credentials::from(request);
        assert_eq!(credentials.email, "a@example.com");
        assert_eq!(credentials.password.expose_secret(), " pw ");
    }

    #[test]
    fn signed_in_state_never_exposes_tokens() {
        let mut state = AuthState::initial();
        state.session = Some(Arc::new(Session::new(
            UserId::new("u1").unwrap(),
            Some("u1@example.com".into()),
            "secret-access-token",
        )));
        state.role = Role::Admin;

        let body = serde_json::to_string(&AuthStateResponse::new(
            &state,
            GuardState::Authenticated,
        ))
        .unwrap();
        assert!(body.contains("\"role\":\"admin\""));
        assert!(body.contains("u1@example.com"));
        assert!(!body.contains("secret-access-token"));
    }
}
