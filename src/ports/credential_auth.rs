//! Credential auth port - sign-in, sign-up and sign-out.
//!
//! Consumed by the login UI and the `/api/auth/*` endpoints. Successful
//! calls are also reported on the implementation's auth-change stream,
//! which is how the session pipeline learns about them.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::auth::{AuthError, Session};

/// Email/password pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Email/password operations against the auth subsystem.
///
/// # Contract
///
/// - `sign_in_with_credentials` returns `AuthError::InvalidCredentials` for
///   a wrong email/password pair.
/// - `sign_up_with_credentials` returns `Ok(None)` when the account was
///   created but must be confirmed by email before a session is issued.
/// - `sign_out` succeeds even when nobody is signed in.
#[async_trait]
pub trait CredentialAuth: Send + Sync {
    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<Session>, AuthError>;

    async fn sign_up_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Arc<Session>>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Hands out a `CredentialAuth` handle scoped to one caller.
///
/// A server answers many callers at once. Each request gets its own handle,
/// seeded with the request's session, so one caller's sign-in or sign-out
/// never replaces another caller's session.
pub trait CredentialAuthProvider: Send + Sync {
    fn for_caller(&self, session: Option<Session>) -> Arc<dyn CredentialAuth>;
}
