//! Request-scoped session source.
//!
//! On the server every request carries its own session (or none). This
//! adapter lets the same session pipeline the browser client uses run once
//! per request: the current session is whatever the bearer token validated
//! to, and the change stream stays silent for the request's lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::auth::{AuthChange, AuthError, Session};
use crate::ports::{AuthSubscription, SessionSource};

pub struct RequestSessionSource {
    session: Option<Arc<Session>>,
    // Held so subscriptions stay open rather than reporting a closed stream.
    changes: broadcast::Sender<AuthChange>,
}

impl RequestSessionSource {
    pub fn new(session: Option<Session>) -> Self {
        let (changes, _) = broadcast::channel(1);
        Self {
            session: session.map(Arc::new),
            changes,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SessionSource for RequestSessionSource {
    async fn current_session(&self) -> Result<Option<Arc<Session>>, AuthError> {
        Ok(self.session.clone())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.changes.subscribe())
    }
}
