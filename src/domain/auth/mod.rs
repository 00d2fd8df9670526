//! Auth domain - sessions, roles, profiles and the gate states built on them.
//!
//! These types have no dependency on the hosted backend; adapters populate
//! them through the ports.

mod errors;
mod guard;
mod profile;
mod role;
mod session;
mod state;

pub use errors::AuthError;
pub use guard::{GuardDecision, GuardState};
pub use profile::ProfileRecord;
pub use role::Role;
pub use session::{same_session, AuthChange, AuthChangeEvent, Session, SessionUser};
pub use state::AuthState;
