//! Route guard states.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

/// Gate state for authenticated-only views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Session presence has not been determined yet.
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    pub fn from_presence(session_present: bool) -> Self {
        if session_present {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }

    /// Applies a session-presence observation (initial check or change event).
    pub fn observe(self, session_present: bool) -> Self {
        let target = Self::from_presence(session_present);
        if target == self {
            return self;
        }
        match self.transition_to(target) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring illegal guard transition");
                self
            }
        }
    }

    /// What the view layer should do in this state.
    pub fn decision(&self, login_path: &str) -> GuardDecision {
        match self {
            GuardState::Checking => GuardDecision::Pending,
            GuardState::Authenticated => GuardDecision::Render,
            GuardState::Unauthenticated => GuardDecision::Redirect {
                to: login_path.to_string(),
            },
        }
    }
}

impl StateMachine for GuardState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GuardState::*;
        matches!(
            (self, target),
            (Checking, Authenticated)
                | (Checking, Unauthenticated)
                | (Authenticated, Unauthenticated)
                | (Unauthenticated, Authenticated)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GuardState::*;
        match self {
            Checking => vec![Authenticated, Unauthenticated],
            Authenticated => vec![Unauthenticated],
            Unauthenticated => vec![Authenticated],
        }
    }
}

/// Outcome of guarding a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Still checking; show a loading indicator.
    Pending,
    /// Render the protected content.
    Render,
    /// Send the visitor to the login view.
    Redirect { to: String },
}
