//! Axum router for the site endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    add_comment, auth_state, health, like_post, like_status, record_view, route_path, route_root,
    sign_in, sign_out, sign_up, unlike_post, SiteAppState,
};

/// Create the site router.
///
/// # Routes
///
/// - `GET /health` - Liveness check
/// - `GET /api/auth/state` - Aggregated auth state for the caller
/// - `POST /api/auth/sign-in` - Email/password sign-in, returns tokens
/// - `POST /api/auth/sign-up` - Account creation (201 with tokens, 202 pending)
/// - `POST /api/auth/sign-out` - Ends the caller's session (auth required)
/// - `POST /api/posts/:post_id/views` - Record a post view (detached)
/// - `GET|POST|DELETE /api/posts/:post_id/likes` - Like status and toggling
/// - `POST /api/posts/:post_id/comments` - Add a comment (auth required)
/// - `GET /` and `GET /*path` - Routing decision for a page path
pub fn site_routes() -> Router<SiteAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/state", get(auth_state))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/posts/:post_id/views", post(record_view))
        .route(
            "/api/posts/:post_id/likes",
            get(like_status).post(like_post).delete(unlike_post),
        )
        .route("/api/posts/:post_id/comments", post(add_comment))
        .route("/", get(route_root))
        .route("/*path", get(route_path))
}
