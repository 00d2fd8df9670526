//! Session+Role Aggregator.
//!
//! `AuthContext` combines a [`SessionProvider`] with a [`RoleResolver`] into
//! a single [`AuthState`]. Whenever the session reference changes the role
//! is reset to `Anonymous` and re-resolved, so a previous session's
//! privileges are never visible under a new one. A resolution overtaken by
//! another session change is abandoned.
//!
//! The context is created by its owner and passed down explicitly; dropping
//! it tears down both driving tasks.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::auth::{same_session, AuthState, Role, Session};
use crate::ports::SessionSource;

use super::{RoleResolver, SessionProvider, SessionSnapshot};

pub struct AuthContext {
    provider: SessionProvider,
    state: watch::Receiver<AuthState>,
    task: JoinHandle<()>,
}

impl AuthContext {
    /// Starts the session provider and the role driver. Must be called
    /// within a tokio runtime.
    pub fn start(source: Arc<dyn SessionSource>, resolver: RoleResolver) -> Self {
        let provider = SessionProvider::start(source);
        let (tx, rx) = watch::channel(AuthState::initial());
        let task = tokio::spawn(drive_roles(provider.subscribe(), resolver, tx));

        Self {
            provider,
            state: rx,
            task,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.state.borrow().session.clone()
    }

    pub fn role(&self) -> Role {
        self.state.borrow().role
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    pub fn session_provider(&self) -> &SessionProvider {
        &self.provider
    }

    /// Waits until neither the session nor the role is loading.
    pub async fn ready(&self) -> AuthState {
        let mut rx = self.state.clone();
        let _ = rx.wait_for(AuthState::is_ready).await;
        let state = rx.borrow().clone();
        state
    }

    /// Stops both driving tasks and waits for the change listener to be
    /// released.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        self.provider.stop().await;
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive_roles(
    mut sessions: watch::Receiver<SessionSnapshot>,
    resolver: RoleResolver,
    state: watch::Sender<AuthState>,
) {
    // Session the published role belongs to; `None` while none is settled.
    let mut resolved_for: Option<Option<Arc<Session>>> = None;

    loop {
        let snapshot = sessions.borrow_and_update().clone();

        let settled = resolved_for
            .as_ref()
            .is_some_and(|prev| same_session(prev, &snapshot.session));
        if settled {
            state.send_if_modified(|s| {
                let changed = s.session_loading != snapshot.loading;
                s.session_loading = snapshot.loading;
                changed
            });
            if sessions.changed().await.is_err() {
                break;
            }
            continue;
        }

        resolved_for = None;
        let target = snapshot.session.clone();
        state.send_modify(|s| {
            s.session = target.clone();
            s.session_loading = snapshot.loading;
            s.role = Role::Anonymous;
            s.role_loading = true;
        });

        let resolution = resolver.resolve(target.as_deref());
        tokio::pin!(resolution);
        let mut stream_open = true;

        let role = loop {
            tokio::select! {
                role = &mut resolution => break Some(role),
                changed = sessions.changed(), if stream_open => {
                    if changed.is_err() {
                        stream_open = false;
                        continue;
                    }
                    let latest = sessions.borrow().clone();
                    if !same_session(&target, &latest.session) {
                        tracing::debug!("Session replaced during role resolution");
                        break None;
                    }
                    state.send_modify(|s| s.session_loading = latest.loading);
                }
            }
        };

        if let Some(role) = role {
            tracing::debug!(role = %role, authenticated = target.is_some(), "Role resolved");
            state.send_modify(|s| {
                s.role = role;
                s.role_loading = false;
            });
            resolved_for = Some(target.clone());
        }
    }
}
