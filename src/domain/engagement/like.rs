use serde::Serialize;

use crate::domain::foundation::{PostId, UserId};

/// A row of the `post_likes` table. One per (post, user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PostLike {
    pub post_id: PostId,
    pub user_id: UserId,
}

impl PostLike {
    pub fn new(post_id: PostId, user_id: UserId) -> Self {
        Self { post_id, user_id }
    }
}
