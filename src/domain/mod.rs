//! Domain layer containing the auth pipeline's types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, errors, state machine trait)
//! - `auth` - Sessions, roles, profiles, aggregated auth state and guard states
//! - `engagement` - Likes and comments on published posts

pub mod auth;
pub mod engagement;
pub mod foundation;
