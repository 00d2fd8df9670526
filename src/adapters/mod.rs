//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Session sources, credential auth and token validation
//! - `profile` - `ProfileStore` implementations
//! - `views` - `ViewRecorder` implementations
//! - `engagement` - `LikeStore` and `CommentStore` implementations
//! - `supabase` - Shared plumbing for the hosted backend
//! - `http` - The axum surface

pub mod auth;
pub mod engagement;
pub mod http;
pub mod profile;
pub mod supabase;
pub mod views;
