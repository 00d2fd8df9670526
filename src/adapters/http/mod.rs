//! HTTP adapters - the axum surface.
//!
//! - `middleware` - Bearer-token validation and session extractors
//! - `site` - Auth, engagement, view tracking and page routing endpoints
//!
//! [`app_router`] assembles them under the configured base path with
//! request tracing, CORS and a request timeout.

pub mod middleware;
pub mod site;

pub use site::{site_routes, SiteAppState};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use self::middleware::{auth_middleware, ValidatorState};

/// Builds the complete application router.
pub fn app_router(state: SiteAppState, validator: ValidatorState, server: &ServerConfig) -> Router {
    let routes = site_routes()
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(validator, auth_middleware));

    let app = if server.base_path == "/" {
        routes
    } else {
        Router::new().nest(&server.base_path, routes)
    };

    app.layer(cors_layer(&server.cors_origins_list()))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
