//! Session Provider.
//!
//! Owns the current session for one consumer tree. On start it subscribes
//! to the auth-change stream and fetches the current session once; both
//! feeds are applied in arrival order, so whichever lands last wins.
//! `loading` clears after the first fetch result, success or failure.
//!
//! Dropping the provider (or calling [`SessionProvider::shutdown`]) aborts
//! the driving task, which releases the subscription and discards any
//! fetch still in flight.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::auth::{AuthChange, AuthError, Session};
use crate::ports::{AuthSubscription, SessionSource};

/// What the provider currently holds.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Option<Arc<Session>>,
    pub loading: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

/// One input to a session follower.
#[derive(Debug)]
pub(crate) enum SessionUpdate {
    /// Result of the one-shot `current_session` call.
    Fetched(Result<Option<Arc<Session>>, AuthError>),
    /// An event from the change stream.
    Changed(AuthChange),
}

/// Drives `apply` from one initial fetch plus the change stream until both
/// are exhausted. The subscription must be taken before calling so no event
/// between subscribe and fetch is lost.
pub(crate) async fn follow_sessions<F>(
    source: Arc<dyn SessionSource>,
    mut subscription: AuthSubscription,
    mut apply: F,
) where
    F: FnMut(SessionUpdate),
{
    let fetch = source.current_session();
    tokio::pin!(fetch);

    let mut fetched = false;
    let mut stream_open = true;

    while !fetched || stream_open {
        tokio::select! {
            result = &mut fetch, if !fetched => {
                fetched = true;
                apply(SessionUpdate::Fetched(result));
            }
            change = subscription.recv(), if stream_open => match change {
                Some(change) => apply(SessionUpdate::Changed(change)),
                None => {
                    tracing::debug!("Auth change stream closed");
                    stream_open = false;
                }
            },
        }
    }
}

pub struct SessionProvider {
    state: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionProvider {
    /// Starts following `source`. Must be called within a tokio runtime.
    pub fn start(source: Arc<dyn SessionSource>) -> Self {
        let (tx, rx) = watch::channel(SessionSnapshot::initial());
        let subscription = source.subscribe();

        let task = tokio::spawn(async move {
            follow_sessions(source, subscription, |update| match update {
                SessionUpdate::Fetched(Ok(session)) => {
                    tracing::debug!(present = session.is_some(), "Initial session fetched");
                    tx.send_replace(SessionSnapshot {
                        session,
                        loading: false,
                    });
                }
                SessionUpdate::Fetched(Err(e)) => {
                    // Treated as signed out; an earlier event, if any, stands.
                    tracing::warn!(error = %e, "Failed to fetch current session");
                    tx.send_modify(|s| s.loading = false);
                }
                SessionUpdate::Changed(change) => {
                    tracing::debug!(event = ?change.event, "Session changed");
                    tx.send_modify(|s| s.session = change.session);
                }
            })
            .await;
        });

        Self { state: rx, task }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.state.borrow().session.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// A receiver that observes every replacement.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Waits until the first fetch has finished.
    pub async fn ready(&self) -> SessionSnapshot {
        let mut rx = self.state.clone();
        // An aborted driver leaves the last published value in place.
        let _ = rx.wait_for(|s| !s.loading).await;
        let snapshot = rx.borrow().clone();
        snapshot
    }

    /// Stops following and waits for the listener to be released.
    pub async fn shutdown(mut self) {
        self.stop().await;
    }

    pub(crate) async fn stop(&mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}
