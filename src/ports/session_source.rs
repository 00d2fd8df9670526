//! Session source port - the auth subsystem as seen by the session pipeline.
//!
//! The pipeline needs two things from the auth collaborator: a one-shot
//! "what is the current session" fetch, and a stream of auth changes.
//! Credential operations live on [`CredentialAuth`](super::CredentialAuth)
//! because the pipeline never calls them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::auth::{AuthChange, AuthError, Session};

/// Provides the current session and change notifications.
///
/// # Contract
///
/// - `current_session` returns `Ok(None)` when nobody is signed in and
///   `Err` only when the subsystem could not be asked.
/// - Every sign-in, sign-out and token refresh is broadcast to all live
///   subscriptions, in the order it happened.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetch the current session, if any.
    async fn current_session(&self) -> Result<Option<Arc<Session>>, AuthError>;

    /// Register a listener for auth changes.
    ///
    /// The listener is released when the returned subscription is dropped.
    fn subscribe(&self) -> AuthSubscription;
}

/// A live listener on the auth-change stream.
///
/// Dropping it (or calling [`AuthSubscription::unsubscribe`]) releases the
/// listener.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    pub fn new(receiver: broadcast::Receiver<AuthChange>) -> Self {
        Self { receiver }
    }

    /// Wait for the next change. Returns `None` once the source is gone.
    ///
    /// A listener that fell behind skips the changes it missed and carries
    /// on from the oldest one still buffered.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Auth change listener lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
