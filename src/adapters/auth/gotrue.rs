//! Supabase GoTrue adapter.
//!
//! Implements `SessionSource` and `CredentialAuth` against the hosted auth
//! service the way its browser client does: the session lives in this
//! process, every sign-in, refresh and sign-out is broadcast to
//! subscribers, and an expired session is refreshed on the next
//! `current_session` call.
//!
//! # Endpoints
//!
//! - `POST /auth/v1/token?grant_type=password` - sign in
//! - `POST /auth/v1/token?grant_type=refresh_token` - refresh
//! - `POST /auth/v1/signup` - sign up
//! - `POST /auth/v1/logout` - sign out

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

use crate::adapters::supabase::SupabaseConfig;
use crate::domain::auth::{AuthChange, AuthChangeEvent, AuthError, Session};
use crate::domain::foundation::UserId;
use crate::ports::{
    AuthSubscription, CredentialAuth, CredentialAuthProvider, Credentials, SessionSource,
};

const CHANGE_CAPACITY: usize = 16;

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue reports errors in two shapes depending on version.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoTrueErrorBody {
    fn message(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }

    fn is_bad_credentials(&self) -> bool {
        matches!(self.error_code.as_deref(), Some("invalid_credentials"))
            || matches!(self.error.as_deref(), Some("invalid_grant"))
    }
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let user_id = UserId::new(self.user.id).map_err(|e| {
            AuthError::service_unavailable(format!("bad user id in token response: {}", e))
        })?;

        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => Utc.timestamp_opt(at, 0).single(),
            (None, Some(secs)) => Some(now + Duration::seconds(secs)),
            (None, None) => None,
        };

        let mut session = Session::new(user_id, self.user.email, self.access_token);
        session.refresh_token = self.refresh_token;
        session.expires_at = expires_at;
        Ok(session)
    }
}

/// GoTrue-backed auth client.
pub struct SupabaseAuthClient {
    config: SupabaseConfig,
    http: reqwest::Client,
    session: RwLock<Option<Arc<Session>>>,
    changes: broadcast::Sender<AuthChange>,
}

impl SupabaseAuthClient {
    /// Create a client with no session.
    pub fn new(config: SupabaseConfig) -> reqwest::Result<Self> {
        let http = config.http_client()?;
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Ok(Self {
            config,
            http,
            session: RwLock::new(None),
            changes,
        })
    }

    /// Seed the client with a previously persisted session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = RwLock::new(Some(Arc::new(session)));
        self
    }

    /// A client sharing this one's configuration and connection pool but
    /// holding its own session and change stream.
    pub fn fork(&self, session: Option<Session>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            config: self.config.clone(),
            http: self.http.clone(),
            session: RwLock::new(session.map(Arc::new)),
            changes,
        }
    }

    async fn replace_session(&self, event: AuthChangeEvent, session: Option<Arc<Session>>) {
        *self.session.write().await = session.clone();
        tracing::debug!(?event, "Auth state changed");
        // No subscribers is fine.
        let _ = self.changes.send(AuthChange::new(event, session));
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.config.anon_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error(response).await;
            tracing::warn!(%status, grant_type, error = %body.message(), "Token request rejected");
            return Err(classify(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;
        token.into_session(Utc::now())
    }

    async fn refresh(&self, current: &Session) -> Result<Option<Arc<Session>>, AuthError> {
        let Some(refresh_token) = current.refresh_token.clone() else {
            tracing::info!(user_id = %current.user_id(), "Session expired without refresh token");
            self.replace_session(AuthChangeEvent::SignedOut, None).await;
            return Ok(None);
        };

        match self
            .token_request(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await
        {
            Ok(session) => {
                let session = Arc::new(session);
                self.replace_session(AuthChangeEvent::TokenRefreshed, Some(session.clone()))
                    .await;
                Ok(Some(session))
            }
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                tracing::info!(error = %e, "Refresh token rejected, signing out");
                self.replace_session(AuthChangeEvent::SignedOut, None).await;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SessionSource for SupabaseAuthClient {
    async fn current_session(&self) -> Result<Option<Arc<Session>>, AuthError> {
        let current = self.session.read().await.clone();
        match current {
            Some(session)
                if session.is_expired_at(Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS)) =>
            {
                self.refresh(&session).await
            }
            other => Ok(other),
        }
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.changes.subscribe())
    }
}

#[async_trait]
impl CredentialAuth for SupabaseAuthClient {
    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<Session>, AuthError> {
        let session = self
            .token_request(
                "password",
                serde_json::json!({
                    "email": credentials.email,
                    "password": credentials.password.expose_secret(),
                }),
            )
            .await?;

        let session = Arc::new(session);
        tracing::info!(user_id = %session.user_id(), "Signed in");
        self.replace_session(AuthChangeEvent::SignedIn, Some(session.clone()))
            .await;
        Ok(session)
    }

    async fn sign_up_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Arc<Session>>, AuthError> {
        let response = self
            .http
            .post(self.config.auth_url("signup"))
            .header("apikey", self.config.anon_key())
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error(response).await;
            tracing::warn!(%status, error = %body.message(), "Sign-up rejected");
            return Err(classify(status, &body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        // With email confirmation on, the answer is the bare user object.
        if body.get("access_token").is_none() {
            tracing::info!("Sign-up pending email confirmation");
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;
        let session = Arc::new(token.into_session(Utc::now())?);
        self.replace_session(AuthChangeEvent::SignedIn, Some(session.clone()))
            .await;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let current = self.session.read().await.clone();

        if let Some(session) = current {
            let result = self
                .http
                .post(self.config.auth_url("logout"))
                .header("apikey", self.config.anon_key())
                .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
                .send()
                .await;

            // The local session goes away whatever the server says.
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "Server-side logout failed");
                }
                Err(e) => tracing::warn!(error = %e, "Server-side logout failed"),
                Ok(_) => {}
            }
        }

        self.replace_session(AuthChangeEvent::SignedOut, None).await;
        Ok(())
    }
}

impl CredentialAuthProvider for SupabaseAuthClient {
    fn for_caller(&self, session: Option<Session>) -> Arc<dyn CredentialAuth> {
        Arc::new(self.fork(session))
    }
}

async fn read_error(response: reqwest::Response) -> GoTrueErrorBody {
    response.json().await.unwrap_or_default()
}

fn classify(status: StatusCode, body: &GoTrueErrorBody) -> AuthError {
    if body.is_bad_credentials() {
        return AuthError::InvalidCredentials;
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return AuthError::service_unavailable(body.message());
    }
    AuthError::Rejected(body.message())
}
