//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types and the state machine trait
//! shared by the auth pipeline.

mod errors;
mod ids;
mod state_machine;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{PostId, UserId};
pub use state_machine::StateMachine;
