//! LikeStore port for the external `post_likes` table.

use async_trait::async_trait;

use crate::domain::auth::Session;
use crate::domain::foundation::{DomainError, PostId};

/// Reads and toggles the caller's like on a post.
///
/// # Contract
///
/// - All calls act as `caller`; the like belongs to the caller's user id.
/// - `like` on an already liked post and `unlike` on a post that is not
///   liked both succeed without changing anything.
#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn is_liked(&self, caller: &Session, post_id: PostId) -> Result<bool, DomainError>;

    async fn like(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError>;

    async fn unlike(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError>;
}
