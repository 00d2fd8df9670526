//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the auth pipeline and the hosted backend. Adapters implement these ports.
//!
//! ## Auth Ports
//!
//! - `SessionSource` - Current session + auth-change stream
//! - `CredentialAuth` - Sign-in, sign-up, sign-out
//! - `CredentialAuthProvider` - One `CredentialAuth` handle per caller
//! - `SessionValidator` - Bearer token → session (HTTP surface)
//!
//! ## Data Ports
//!
//! - `ProfileStore` - `profiles` table reads and lazy creation
//! - `ViewRecorder` - `post_views` inserts and the view counter
//! - `LikeStore` - `post_likes` reads and toggles
//! - `CommentStore` - `comments` inserts

mod comment_store;
mod credential_auth;
mod like_store;
mod profile_store;
mod session_source;
mod session_validator;
mod view_recorder;

pub use comment_store::CommentStore;
pub use credential_auth::{CredentialAuth, CredentialAuthProvider, Credentials};
pub use like_store::LikeStore;
pub use profile_store::{ProfileStore, ProfileStoreError};
pub use session_source::{AuthSubscription, SessionSource};
pub use session_validator::SessionValidator;
pub use view_recorder::{PostView, ViewRecorder};
