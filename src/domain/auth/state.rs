//! Aggregated session + role snapshot.

use std::sync::Arc;

use super::{Role, Session};

/// What the view tree sees: the current session, the resolved role, and
/// whether either is still loading.
///
/// `role` is only meaningful once [`AuthState::is_ready`] is true. While a
/// resolution is pending it holds `Anonymous`.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub session: Option<Arc<Session>>,
    pub role: Role,
    pub session_loading: bool,
    pub role_loading: bool,
}

impl AuthState {
    /// State before anything has been fetched.
    pub fn initial() -> Self {
        Self {
            session: None,
            role: Role::Anonymous,
            session_loading: true,
            role_loading: true,
        }
    }

    pub fn loading(&self) -> bool {
        self.session_loading || self.role_loading
    }

    pub fn is_ready(&self) -> bool {
        !self.loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_loading_and_anonymous() {
        let state = AuthState::initial();
        assert!(state.loading());
        assert_eq!(state.role, Role::Anonymous);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn ready_requires_both_loads_finished() {
        let mut state = AuthState::initial();
        state.session_loading = false;
        assert!(!state.is_ready());
        state.role_loading = false;
        assert!(state.is_ready());
        state.session_loading = true;
        assert!(!state.is_ready());
    }
}
