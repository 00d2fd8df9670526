//! Route Guard.
//!
//! Gates authenticated-only views on session presence alone. It runs its
//! own presence check and its own change-stream listener, independent of
//! [`AuthContext`](super::AuthContext), so gating never waits on role data.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::auth::{GuardDecision, GuardState};
use crate::ports::SessionSource;

use super::session_provider::{follow_sessions, SessionUpdate};

pub struct RouteGuard {
    state: watch::Receiver<GuardState>,
    login_path: String,
    task: JoinHandle<()>,
}

impl RouteGuard {
    /// Starts in `Checking` and settles once the presence check answers or
    /// a change event arrives. Must be called within a tokio runtime.
    pub fn start(source: Arc<dyn SessionSource>, login_path: impl Into<String>) -> Self {
        let (tx, rx) = watch::channel(GuardState::Checking);
        let subscription = source.subscribe();

        let task = tokio::spawn(async move {
            follow_sessions(source, subscription, |update| {
                let present = match update {
                    SessionUpdate::Fetched(Ok(session)) => session.is_some(),
                    SessionUpdate::Fetched(Err(e)) => {
                        tracing::warn!(error = %e, "Session check failed, treating as signed out");
                        false
                    }
                    SessionUpdate::Changed(change) => change.session.is_some(),
                };
                tx.send_if_modified(|state| {
                    let next = state.observe(present);
                    let changed = next != *state;
                    if changed {
                        tracing::debug!(from = ?state, to = ?next, "Guard state changed");
                    }
                    *state = next;
                    changed
                });
            })
            .await;
        });

        Self {
            state: rx,
            login_path: login_path.into(),
            task,
        }
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn decision(&self) -> GuardDecision {
        self.state().decision(&self.login_path)
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.clone()
    }

    /// Waits until the guard has left `Checking`.
    pub async fn settled(&self) -> GuardState {
        let mut rx = self.state.clone();
        let _ = rx.wait_for(|s| *s != GuardState::Checking).await;
        let state = *rx.borrow();
        state
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
