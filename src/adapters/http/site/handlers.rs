//! HTTP handlers for the site endpoints.
//!
//! Every routing request runs the same session pipeline a browser client
//! runs: the validated bearer session (or none) feeds an `AuthContext` and
//! an independent `RouteGuard`, and the view router decides what to serve.
//!
//! Sign-in, sign-up and sign-out go through a `CredentialAuth` handle
//! scoped to the request.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header::USER_AGENT, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;

use crate::adapters::auth::RequestSessionSource;
use crate::adapters::http::middleware::{OptionalAuth, RequireAuth};
use crate::application::{
    AuthContext, Engagement, RoleResolver, RouteGuard, View, ViewRouter, ViewTracker, LOGIN_PATH,
};
use crate::domain::auth::{AuthError, AuthState, GuardDecision, GuardState, Session};
use crate::domain::foundation::{DomainError, ErrorCode, PostId};
use crate::ports::{CredentialAuthProvider, Credentials, PostView, SessionSource};

use super::dto::{
    AuthStateResponse, CommentRequest, CommentResponse, ConfirmationPendingResponse,
    CredentialsRequest, ErrorResponse, LikeStatusResponse, RoutingResponse, SessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the site handlers.
#[derive(Clone)]
pub struct SiteAppState {
    pub resolver: RoleResolver,
    pub views: ViewTracker,
    pub auth: Arc<dyn CredentialAuthProvider>,
    pub engagement: Engagement,
    /// Prefix added to redirect targets.
    pub base_path: String,
}

impl SiteAppState {
    pub fn new(
        resolver: RoleResolver,
        views: ViewTracker,
        auth: Arc<dyn CredentialAuthProvider>,
        engagement: Engagement,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            views,
            auth,
            engagement,
            base_path: base_path.into(),
        }
    }

    fn absolute(&self, path: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        format!("{}{}", base, path)
    }

    /// Runs the session pipeline for one request.
    async fn evaluate(&self, session: Option<Session>) -> (AuthState, GuardState) {
        let source: Arc<dyn SessionSource> = Arc::new(RequestSessionSource::new(session));
        let context = AuthContext::start(source.clone(), self.resolver.clone());
        let guard = RouteGuard::start(source, LOGIN_PATH);

        let (state, guard_state) = tokio::join!(context.ready(), guard.settled());
        context.shutdown().await;
        guard.shutdown().await;
        (state, guard_state)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /api/auth/state`
pub async fn auth_state(
    State(state): State<SiteAppState>,
    OptionalAuth(session): OptionalAuth,
) -> Json<AuthStateResponse> {
    let (auth, guard) = state.evaluate(session).await;
    Json(AuthStateResponse::new(&auth, guard))
}

/// `POST /api/auth/sign-in`
pub async fn sign_in(
    State(state): State<SiteAppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, SiteApiError> {
    let credentials = Credentials::from(request);
    let session = state
        .auth
        .for_caller(None)
        .sign_in_with_credentials(&credentials)
        .await?;

    let role = state.resolver.resolve(Some(session.as_ref())).await;
    Ok(Json(SessionResponse::new(&session, role)))
}

/// `POST /api/auth/sign-up`
///
/// 201 with tokens, or 202 when the account must be confirmed first.
pub async fn sign_up(
    State(state): State<SiteAppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Response, SiteApiError> {
    let credentials = Credentials::from(request);
    let issued = state
        .auth
        .for_caller(None)
        .sign_up_with_credentials(&credentials)
        .await?;

    let Some(session) = issued else {
        let body = ConfirmationPendingResponse {
            confirmation_required: true,
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    };

    let role = state.resolver.resolve(Some(session.as_ref())).await;
    Ok((StatusCode::CREATED, Json(SessionResponse::new(&session, role))).into_response())
}

/// `POST /api/auth/sign-out`
pub async fn sign_out(
    State(state): State<SiteAppState>,
    RequireAuth(session): RequireAuth,
) -> Result<StatusCode, SiteApiError> {
    let user_id = session.user_id().clone();
    state.auth.for_caller(Some(session)).sign_out().await?;
    tracing::info!(user_id = %user_id, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/posts/:post_id/views`
pub async fn record_view(
    State(state): State<SiteAppState>,
    OptionalAuth(session): OptionalAuth,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, SiteApiError> {
    let post_id = parse_post_id(&post_id)?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let view = PostView::new(post_id)
        .by_user(session.as_ref().map(|s| s.user_id().clone()))
        .with_user_agent(user_agent);

    state.views.track(session, view);
    Ok(StatusCode::ACCEPTED)
}

/// `GET /api/posts/:post_id/likes`
pub async fn like_status(
    State(state): State<SiteAppState>,
    OptionalAuth(session): OptionalAuth,
    Path(post_id): Path<String>,
) -> Result<Json<LikeStatusResponse>, SiteApiError> {
    let post_id = parse_post_id(&post_id)?;
    let liked = state.engagement.is_liked(session.as_ref(), post_id).await?;
    Ok(Json(LikeStatusResponse {
        post_id: post_id.to_string(),
        liked,
    }))
}

/// `POST /api/posts/:post_id/likes`
pub async fn like_post(
    State(state): State<SiteAppState>,
    RequireAuth(session): RequireAuth,
    Path(post_id): Path<String>,
) -> Result<Json<LikeStatusResponse>, SiteApiError> {
    let post_id = parse_post_id(&post_id)?;
    state.engagement.like(&session, post_id).await?;
    Ok(Json(LikeStatusResponse {
        post_id: post_id.to_string(),
        liked: true,
    }))
}

/// `DELETE /api/posts/:post_id/likes`
pub async fn unlike_post(
    State(state): State<SiteAppState>,
    RequireAuth(session): RequireAuth,
    Path(post_id): Path<String>,
) -> Result<Json<LikeStatusResponse>, SiteApiError> {
    let post_id = parse_post_id(&post_id)?;
    state.engagement.unlike(&session, post_id).await?;
    Ok(Json(LikeStatusResponse {
        post_id: post_id.to_string(),
        liked: false,
    }))
}

/// `POST /api/posts/:post_id/comments`
pub async fn add_comment(
    State(state): State<SiteAppState>,
    RequireAuth(session): RequireAuth,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), SiteApiError> {
    let post_id = parse_post_id(&post_id)?;
    let comment = state
        .engagement
        .comment(&session, post_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

fn parse_post_id(raw: &str) -> Result<PostId, SiteApiError> {
    raw.parse::<PostId>().map_err(|_| {
        SiteApiError::from(DomainError::new(
            ErrorCode::InvalidFormat,
            "Post id must be a UUID",
        ))
    })
}

/// `GET /`
pub async fn route_root(
    State(state): State<SiteAppState>,
    OptionalAuth(session): OptionalAuth,
) -> Response {
    route(&state, session, "/").await
}

/// `GET /*path`
pub async fn route_path(
    State(state): State<SiteAppState>,
    OptionalAuth(session): OptionalAuth,
    Path(path): Path<String>,
) -> Response {
    route(&state, session, &path).await
}

async fn route(state: &SiteAppState, session: Option<Session>, path: &str) -> Response {
    let session_present = session.is_some();
    let (auth, guard) = state.evaluate(session).await;
    let view = ViewRouter::route(auth.role, session_present, path);

    if view.requires_session() {
        if let GuardDecision::Redirect { to } = guard.decision(LOGIN_PATH) {
            tracing::debug!(path, "Unauthenticated request redirected to login");
            return Redirect::to(&state.absolute(&to)).into_response();
        }
    }

    let status = match &view {
        View::Redirect { to } => return Redirect::to(&state.absolute(to)).into_response(),
        View::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };

    (
        status,
        Json(RoutingResponse {
            view,
            role: auth.role,
        }),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain and auth errors to HTTP responses.
#[derive(Debug)]
pub enum SiteApiError {
    Domain(DomainError),
    Auth(AuthError),
}

impl From<DomainError> for SiteApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AuthError> for SiteApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl IntoResponse for SiteApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            SiteApiError::Domain(err) => {
                let status = match err.code {
                    ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
                    ErrorCode::Forbidden => StatusCode::FORBIDDEN,
                    ErrorCode::BackendError => {
                        tracing::error!(error = %err, "Backend call failed");
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, err.code.to_string(), err.message.clone())
            }
            SiteApiError::Auth(err) => {
                let (status, code) = match err {
                    AuthError::InvalidCredentials => {
                        (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
                    }
                    AuthError::InvalidToken | AuthError::TokenExpired => {
                        (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
                    }
                    AuthError::Rejected(_) => (StatusCode::BAD_REQUEST, "AUTH_REJECTED"),
                    AuthError::ServiceUnavailable(_) => {
                        tracing::error!(error = %err, "Auth service unavailable");
                        (StatusCode::SERVICE_UNAVAILABLE, "AUTH_UNAVAILABLE")
                    }
                };
                (status, code.to_string(), err.to_string())
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
