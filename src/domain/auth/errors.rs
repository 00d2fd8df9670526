//! Authentication errors.
//!
//! These errors are domain-centric: they describe what went wrong from the
//! application's point of view, not the auth provider's wire format.

use thiserror::Error;

/// Errors raised by the auth collaborator and the session validator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// Email/password pair was rejected.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token signature is valid but it has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The auth service refused the request (e.g. email already registered).
    #[error("Auth request rejected: {0}")]
    Rejected(String),

    /// The auth service is unreachable or answered unexpectedly.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should sign in again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
