//! ViewRecorder port - post view tracking.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::auth::Session;
use crate::domain::foundation::{DomainError, PostId, UserId};

/// One view of a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub post_id: PostId,
    /// Viewer, when signed in.
    pub user_id: Option<UserId>,
    pub user_agent: Option<String>,
}

impl PostView {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            user_id: None,
            user_agent: None,
        }
    }

    pub fn by_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Appends rows to the `post_views` table and bumps the post's view
/// counter. Both calls act as `caller`, or anonymously when `None`.
#[async_trait]
pub trait ViewRecorder: Send + Sync {
    async fn record_view(
        &self,
        caller: Option<&Session>,
        view: &PostView,
    ) -> Result<(), DomainError>;

    async fn increment_views(
        &self,
        caller: Option<&Session>,
        post_id: PostId,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_view_serializes_null_user() {
        let view = PostView::new(PostId::new());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["user_id"].is_null());
        assert!(json["user_agent"].is_null());
    }

    #[test]
    fn builder_sets_viewer() {
        let view = PostView::new(PostId::new())
            .by_user(Some(UserId::new("u1").unwrap()))
            .with_user_agent(Some("curl/8".into()));
        assert_eq!(view.user_id.unwrap().as_str(), "u1");
        assert_eq!(view.user_agent.as_deref(), Some("curl/8"));
    }
}
