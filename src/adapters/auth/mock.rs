//! Mock authentication adapters for testing.
//!
//! These adapters implement the auth ports without a hosted backend:
//!
//! - `MockAuthClient` - `SessionSource` + `CredentialAuth` backed by an
//!   in-memory account table and a broadcast channel
//! - `MockSessionValidator` - `SessionValidator` backed by a token map
//!
//! # Example
//!
//! ```ignore
//! let client = MockAuthClient::new().with_account("a@example.com", "pw", "u1");
//! let mut sub = client.subscribe();
//! client.sign_in_with_credentials(&Credentials::new("a@example.com", "pw")).await?;
//! assert_eq!(sub.recv().await.unwrap().event, AuthChangeEvent::SignedIn);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::sync::{broadcast, Notify};

use crate::domain::auth::{AuthChange, AuthChangeEvent, AuthError, Session};
use crate::domain::foundation::UserId;
use crate::ports::{
    AuthSubscription, CredentialAuth, CredentialAuthProvider, Credentials, SessionSource,
    SessionValidator,
};

const CHANGE_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    user_id: UserId,
}

/// Mock auth client for testing.
///
/// Holds at most one session, like a browser client does. Every change to
/// it is broadcast to subscribers.
#[derive(Debug)]
pub struct MockAuthClient {
    session: RwLock<Option<Arc<Session>>>,
    /// Shared with every handle from `for_caller`.
    accounts: Arc<RwLock<HashMap<String, MockAccount>>>,
    changes: broadcast::Sender<AuthChange>,
    /// Optional error returned by `current_session` (for error testing)
    force_error: RwLock<Option<AuthError>>,
    /// When set, `current_session` waits for a notification before answering.
    fetch_gate: RwLock<Option<Arc<Notify>>>,
    require_confirmation: bool,
    fetches: AtomicUsize,
    /// Shared with every handle from `for_caller`.
    sign_outs: Arc<AtomicUsize>,
}

impl Default for MockAuthClient {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            session: RwLock::new(None),
            accounts: Arc::new(RwLock::new(HashMap::new())),
            changes,
            force_error: RwLock::new(None),
            fetch_gate: RwLock::new(None),
            require_confirmation: false,
            fetches: AtomicUsize::new(0),
            sign_outs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockAuthClient {
    /// Creates a client with no session and no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out signed in with the given session.
    pub fn with_session(self, session: Session) -> Self {
        *self.session.write().expect("MockAuthClient: lock poisoned") = Some(Arc::new(session));
        self
    }

    /// Starts out signed in as a simple test user.
    pub fn with_test_session(self, user_id: impl Into<String>) -> Self {
        let session = test_session(&user_id.into());
        self.with_session(session)
    }

    /// Registers an account that `sign_in_with_credentials` accepts.
    pub fn with_account(
        self,
        email: impl Into<String>,
        password: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let account = MockAccount {
            password: password.into(),
            user_id: UserId::new(user_id).expect("MockAuthClient: empty user id"),
        };
        self.accounts
            .write()
            .expect("MockAuthClient: lock poisoned")
            .insert(email.into(), account);
        self
    }

    /// Sign-ups create the account but issue no session until confirmed.
    pub fn requiring_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Forces `current_session` to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().expect("MockAuthClient: lock poisoned") = Some(error);
        self
    }

    /// Clears the forced error.
    pub fn clear_error(&self) {
        *self.force_error.write().expect("MockAuthClient: lock poisoned") = None;
    }

    /// Holds every subsequent `current_session` call until the returned
    /// handle is notified. The answer is the session held at call time.
    pub fn pause_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.write().expect("MockAuthClient: lock poisoned") = Some(gate.clone());
        gate
    }

    /// Replaces the held session and broadcasts the change.
    pub fn emit(&self, event: AuthChangeEvent, session: Option<Session>) -> Option<Arc<Session>> {
        let session = session.map(Arc::new);
        *self.session.write().expect("MockAuthClient: lock poisoned") = session.clone();
        // No subscribers is fine.
        let _ = self.changes.send(AuthChange::new(event, session.clone()));
        session
    }

    /// Number of live change subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Number of `current_session` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `sign_out` calls made through this client or its handles.
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn issue_session(&self, email: &str, user_id: &UserId) -> Arc<Session> {
        let token = format!("mock-access-{}", uuid::Uuid::new_v4());
        let session = Session::new(user_id.clone(), Some(email.to_string()), token)
            .with_refresh_token(format!("mock-refresh-{}", uuid::Uuid::new_v4()));
        self.emit(AuthChangeEvent::SignedIn, Some(session))
            .expect("MockAuthClient: emitted session missing")
    }
}

#[async_trait]
impl SessionSource for MockAuthClient {
    async fn current_session(&self) -> Result<Option<Arc<Session>>, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .force_error
            .read()
            .expect("MockAuthClient: lock poisoned")
            .clone()
        {
            return Err(error);
        }

        let snapshot = self
            .session
            .read()
            .expect("MockAuthClient: lock poisoned")
            .clone();
        let gate = self
            .fetch_gate
            .read()
            .expect("MockAuthClient: lock poisoned")
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(snapshot)
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.changes.subscribe())
    }
}

#[async_trait]
impl CredentialAuth for MockAuthClient {
    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<Session>, AuthError> {
        let account = self
            .accounts
            .read()
            .expect("MockAuthClient: lock poisoned")
            .get(&credentials.email)
            .cloned();

        match account {
            Some(account) if account.password == *credentials.password.expose_secret() => {
                Ok(self.issue_session(&credentials.email, &account.user_id))
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_up_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Arc<Session>>, AuthError> {
        let user_id = {
            let mut accounts = self.accounts.write().expect("MockAuthClient: lock poisoned");
            if accounts.contains_key(&credentials.email) {
                return Err(AuthError::Rejected("User already registered".to_string()));
            }
            let user_id = UserId::new(uuid::Uuid::new_v4().to_string())
                .map_err(|e| AuthError::Rejected(e.to_string()))?;
            accounts.insert(
                credentials.email.clone(),
                MockAccount {
                    password: credentials.password.expose_secret().clone(),
                    user_id: user_id.clone(),
                },
            );
            user_id
        };

        if self.require_confirmation {
            return Ok(None);
        }
        Ok(Some(self.issue_session(&credentials.email, &user_id)))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.emit(AuthChangeEvent::SignedOut, None);
        Ok(())
    }
}

impl CredentialAuthProvider for MockAuthClient {
    /// A fresh client over the same account table, seeded with `session`.
    fn for_caller(&self, session: Option<Session>) -> Arc<dyn CredentialAuth> {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Arc::new(MockAuthClient {
            session: RwLock::new(session.map(Arc::new)),
            accounts: self.accounts.clone(),
            changes,
            force_error: RwLock::new(None),
            fetch_gate: RwLock::new(None),
            require_confirmation: self.require_confirmation,
            fetches: AtomicUsize::new(0),
            sign_outs: self.sign_outs.clone(),
        })
    }
}

/// Mock session validator for testing.
///
/// Stores a map of tokens to sessions. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, Session>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token for a simple test user.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let token = token.into();
        let mut session = test_session(&user_id.into());
        session.access_token = token.clone();
        self.tokens
            .write()
            .expect("MockSessionValidator: lock poisoned")
            .insert(token, session);
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self
            .force_error
            .write()
            .expect("MockSessionValidator: lock poisoned") = Some(error);
        self
    }

    /// Removes a token, making it invalid.
    pub fn remove_token(&self, token: &str) {
        self.tokens
            .write()
            .expect("MockSessionValidator: lock poisoned")
            .remove(token);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<Session, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .expect("MockSessionValidator: lock poisoned")
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .expect("MockSessionValidator: lock poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

fn test_session(user_id: &str) -> Session {
    Session::new(
        UserId::new(user_id).expect("test user id must not be empty"),
        Some(format!("{}@test.example.com", user_id)),
        format!("mock-access-{}", user_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // MockAuthClient Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn fresh_client_has_no_session() {
        let client = MockAuthClient::new();
        assert!(client.current_session().await.unwrap().is_none());
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn with_test_session_is_returned() {
        let client = MockAuthClient::new().with_test_session("u1");
        let session = client.current_session().await.unwrap().unwrap();
        assert_eq!(session.user_id().as_str(), "u1");
    }

    #[tokio::test]
    async fn forced_error_is_returned_until_cleared() {
        let client = MockAuthClient::new()
            .with_error(AuthError::service_unavailable("down"));
        assert!(client.current_session().await.is_err());

        client.clear_error();
        assert!(client.current_session().await.is_ok());
    }

    #[tokio::test]
    async fn sign_in_broadcasts_signed_in() {
        let client = MockAuthClient::new().with_account("a@example.com", "pw", "u1");
        let mut sub = client.subscribe();

        let session = client
            .sign_in_with_credentials(&Credentials::new("a@example.com", "pw"))
            .await
            .unwrap();

        let change = sub.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedIn);
        assert!(Arc::ptr_eq(&change.session.unwrap(), &session));
        assert_eq!(session.user_id().as_str(), "u1");
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let client = MockAuthClient::new().with_account("a@example.com", "pw", "u1");
        let result = client
            .sign_in_with_credentials(&Credentials::new("a@example.com", "nope"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn sign_up_twice_is_rejected() {
        let client = MockAuthClient::new();
        let creds = Credentials::new("new@example.com", "pw");

        assert!(client.sign_up_with_credentials(&creds).await.unwrap().is_some());
        assert!(matches!(
            client.sign_up_with_credentials(&creds).await,
            Err(AuthError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn sign_up_requiring_confirmation_issues_no_session() {
        let client = MockAuthClient::new().requiring_confirmation();
        let result = client
            .sign_up_with_credentials(&Credentials::new("new@example.com", "pw"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(client.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn caller_handles_share_accounts_but_not_sessions() {
        let client = MockAuthClient::new().with_account("a@example.com", "pw", "u1");
        let handle = client.for_caller(None);

        handle
            .sign_in_with_credentials(&Credentials::new("a@example.com", "pw"))
            .await
            .unwrap();
        client
            .for_caller(Some(test_session("u1")))
            .sign_out()
            .await
            .unwrap();

        assert!(client.current_session().await.unwrap().is_none());
        assert_eq!(client.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_broadcasts() {
        let client = MockAuthClient::new().with_test_session("u1");
        let mut sub = client.subscribe();

        client.sign_out().await.unwrap();

        let change = sub.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
        assert!(change.session.is_none());
        assert!(client.current_session().await.unwrap().is_none());
    }

    #[test]
    fn subscriber_count_tracks_live_subscriptions() {
        let client = MockAuthClient::new();
        let a = client.subscribe();
        let b = client.subscribe();
        assert_eq!(client.subscriber_count(), 2);
        drop(a);
        b.unsubscribe();
        assert_eq!(client.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn paused_fetch_answers_with_call_time_snapshot() {
        let client = Arc::new(MockAuthClient::new());
        let gate = client.pause_fetches();

        let fetch = tokio::spawn({
            let client = client.clone();
            async move { client.current_session().await }
        });
        while client.fetch_count() == 0 {
            tokio::task::yield_now().await;
        }

        client.emit(AuthChangeEvent::SignedIn, Some(test_session("late")));
        gate.notify_one();

        assert!(fetch.await.unwrap().unwrap().is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // MockSessionValidator Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validator_returns_session_for_registered_token() {
        let validator = MockSessionValidator::new().with_test_user("tok", "u1");
        let session = validator.validate("tok").await.unwrap();
        assert_eq!(session.user_id().as_str(), "u1");
        assert_eq!(session.access_token, "tok");
    }

    #[tokio::test]
    async fn validator_rejects_unknown_and_removed_tokens() {
        let validator = MockSessionValidator::new().with_test_user("tok", "u1");
        assert_eq!(validator.validate("other").await, Err(AuthError::InvalidToken));

        validator.remove_token("tok");
        assert_eq!(validator.validate("tok").await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn validator_with_error_forces_error() {
        let validator = MockSessionValidator::new()
            .with_test_user("tok", "u1")
            .with_error(AuthError::TokenExpired);
        assert_eq!(validator.validate("tok").await, Err(AuthError::TokenExpired));
    }
}
