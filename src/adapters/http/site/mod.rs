//! Site HTTP adapter: auth, engagement, view tracking and page routing.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AuthStateResponse, CommentResponse, ErrorResponse, LikeStatusResponse, RoutingResponse,
    SessionResponse,
};
pub use handlers::{SiteApiError, SiteAppState};
pub use routes::site_routes;
