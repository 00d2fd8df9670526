//! Application layer - the session/role pipeline.
//!
//! Leaves first:
//!
//! - `SessionProvider` - current session + change stream, one owner task
//! - `RoleResolver` - session → role via the profile store
//! - `AuthContext` - session and role combined into one `AuthState`
//! - `RouteGuard` - session-presence gate for protected views
//! - `ViewRouter` - role + path → view
//! - `Engagement` - role-gated likes and comments
//!
//! Detached side effects (profile creation, view tracking) go through
//! `BackgroundTasks`.

mod auth_context;
mod background;
mod engagement;
mod role_resolver;
mod route_guard;
mod session_provider;
mod view_router;
mod view_tracking;

pub use auth_context::AuthContext;
pub use background::BackgroundTasks;
pub use engagement::Engagement;
pub use role_resolver::RoleResolver;
pub use route_guard::RouteGuard;
pub use session_provider::{SessionProvider, SessionSnapshot};
pub use view_router::{Area, RouteTable, View, ViewRouter, HOME_PATH, LOGIN_PATH};
pub use view_tracking::ViewTracker;
