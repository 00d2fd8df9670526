//! HTTP middleware for axum.
//!
//! - `auth` - Bearer-token validation and session extractors

pub mod auth;

pub use auth::{auth_middleware, AuthRejection, OptionalAuth, RequireAuth, ValidatorState};
