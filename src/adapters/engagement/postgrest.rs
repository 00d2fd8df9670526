//! PostgREST adapters for `post_likes` and `comments`.
//!
//! Both act as the caller, so the backend's row-level rules check that a
//! like or comment belongs to the signed-in user.

use async_trait::async_trait;

use crate::adapters::supabase::{PostgrestClient, PostgrestError};
use crate::domain::auth::Session;
use crate::domain::engagement::{NewComment, PostLike};
use crate::domain::foundation::{DomainError, ErrorCode, PostId};
use crate::ports::{CommentStore, LikeStore};

const LIKES: &str = "post_likes";
const COMMENTS: &str = "comments";

fn backend_error(action: &str, post_id: PostId, err: PostgrestError) -> DomainError {
    DomainError::new(ErrorCode::BackendError, format!("Failed to {}: {}", action, err))
        .with_detail("post_id", post_id.to_string())
}

/// `LikeStore` over the hosted `post_likes` table.
pub struct PostgrestLikeStore {
    client: PostgrestClient,
}

impl PostgrestLikeStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LikeStore for PostgrestLikeStore {
    async fn is_liked(&self, caller: &Session, post_id: PostId) -> Result<bool, DomainError> {
        let post = post_id.to_string();
        self.client
            .for_caller(Some(caller))
            .exists(
                LIKES,
                &[("post_id", post.as_str()), ("user_id", caller.user_id().as_str())],
            )
            .await
            .map_err(|e| backend_error("check like", post_id, e))
    }

    async fn like(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        let row = PostLike::new(post_id, caller.user_id().clone());
        match self.client.for_caller(Some(caller)).insert(LIKES, &row).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unique_violation() => {
                tracing::debug!(%post_id, user_id = %caller.user_id(), "Post already liked");
                Ok(())
            }
            Err(e) => Err(backend_error("like post", post_id, e)),
        }
    }

    async fn unlike(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        let post = post_id.to_string();
        self.client
            .for_caller(Some(caller))
            .delete(
                LIKES,
                &[("post_id", post.as_str()), ("user_id", caller.user_id().as_str())],
            )
            .await
            .map_err(|e| backend_error("unlike post", post_id, e))
    }
}

/// `CommentStore` over the hosted `comments` table.
pub struct PostgrestCommentStore {
    client: PostgrestClient,
}

impl PostgrestCommentStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommentStore for PostgrestCommentStore {
    async fn add_comment(&self, caller: &Session, comment: &NewComment) -> Result<(), DomainError> {
        self.client
            .for_caller(Some(caller))
            .insert(COMMENTS, comment)
            .await
            .map_err(|e| backend_error("add comment", comment.post_id, e))
    }
}
