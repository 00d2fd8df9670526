//! Session values issued by the external auth subsystem.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// Identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// An authenticated session.
///
/// Sessions are immutable: a token refresh produces a new `Session` that
/// replaces the old one. Consumers share them as `Arc<Session>` and compare
/// by pointer to detect replacement.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: UserId, email: Option<String>, access_token: impl Into<String>) -> Self {
        Self {
            user: SessionUser { id: user_id, email },
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    /// True once `now` is at or past the expiry. Sessions without an expiry
    /// never expire locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Returns true when both slots hold the same session value (by pointer),
/// or both are empty.
pub fn same_session(a: &Option<Arc<Session>>, b: &Option<Arc<Session>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

/// Kind of auth state change reported by the auth subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A single notification on the auth-change stream.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<Arc<Session>>,
}

impl AuthChange {
    pub fn new(event: AuthChangeEvent, session: Option<Arc<Session>>) -> Self {
        Self { event, session }
    }

    pub fn signed_in(session: Arc<Session>) -> Self {
        Self::new(AuthChangeEvent::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthChangeEvent::SignedOut, None)
    }
}
