//! Engagement - likes and comments on published posts.
//!
//! Any signed-in reader whose role is not `Anonymous` may like, unlike or
//! comment. The role is resolved per call through `RoleResolver`.

use std::sync::Arc;

use crate::domain::auth::{Role, Session};
use crate::domain::engagement::NewComment;
use crate::domain::foundation::{DomainError, ErrorCode, PostId};
use crate::ports::{CommentStore, LikeStore};

use super::RoleResolver;

#[derive(Clone)]
pub struct Engagement {
    resolver: RoleResolver,
    likes: Arc<dyn LikeStore>,
    comments: Arc<dyn CommentStore>,
}

impl Engagement {
    pub fn new(
        resolver: RoleResolver,
        likes: Arc<dyn LikeStore>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            resolver,
            likes,
            comments,
        }
    }

    /// Whether the caller has liked the post. Always false without a session.
    pub async fn is_liked(
        &self,
        caller: Option<&Session>,
        post_id: PostId,
    ) -> Result<bool, DomainError> {
        match caller {
            Some(session) => self.likes.is_liked(session, post_id).await,
            None => Ok(false),
        }
    }

    pub async fn like(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        self.authorize(caller).await?;
        self.likes.like(caller, post_id).await?;
        tracing::info!(%post_id, user_id = %caller.user_id(), "Post liked");
        Ok(())
    }

    pub async fn unlike(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        self.authorize(caller).await?;
        self.likes.unlike(caller, post_id).await?;
        tracing::info!(%post_id, user_id = %caller.user_id(), "Post unliked");
        Ok(())
    }

    /// Validates and stores a comment, returning what was stored.
    pub async fn comment(
        &self,
        caller: &Session,
        post_id: PostId,
        content: &str,
    ) -> Result<NewComment, DomainError> {
        self.authorize(caller).await?;
        let comment = NewComment::new(post_id, caller.user_id().clone(), content)?;
        self.comments.add_comment(caller, &comment).await?;
        tracing::info!(%post_id, user_id = %caller.user_id(), "Comment added");
        Ok(comment)
    }

    async fn authorize(&self, caller: &Session) -> Result<Role, DomainError> {
        let role = self.resolver.resolve(Some(caller)).await;
        if role == Role::Anonymous {
            tracing::debug!(user_id = %caller.user_id(), "Engagement refused for anonymous role");
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Anonymous readers cannot like or comment",
            ));
        }
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::engagement::{InMemoryCommentStore, InMemoryLikeStore};
    use crate::adapters::profile::InMemoryProfileStore;
    use crate::application::BackgroundTasks;
    use crate::domain::foundation::UserId;

    struct Fixture {
        engagement: Engagement,
        likes: Arc<InMemoryLikeStore>,
        comments: Arc<InMemoryCommentStore>,
    }

    fn fixture(profiles: InMemoryProfileStore) -> Fixture {
        let resolver = RoleResolver::new(Arc::new(profiles), Arc::new(BackgroundTasks::new()));
        let likes = Arc::new(InMemoryLikeStore::new());
        let comments = Arc::new(InMemoryCommentStore::new());
        Fixture {
            engagement: Engagement::new(resolver, likes.clone(), comments.clone()),
            likes,
            comments,
        }
    }

    fn session(id: &str) -> Session {
        Session::new(UserId::new(id).unwrap(), None, "token")
    }

    #[tokio::test]
    async fn reader_can_like_and_unlike() {
        let f = fixture(InMemoryProfileStore::new().with_profile("reader", Role::User));
        let post_id = PostId::new();

        f.engagement.like(&session("reader"), post_id).await.unwrap();
        assert!(f.engagement.is_liked(Some(&session("reader")), post_id).await.unwrap());

        f.engagement.unlike(&session("reader"), post_id).await.unwrap();
        assert_eq!(f.likes.like_count(post_id), 0);
    }

    #[tokio::test]
    async fn anonymous_role_cannot_like_or_comment() {
        let f = fixture(InMemoryProfileStore::new().with_profile("ghost", Role::Anonymous));
        let post_id = PostId::new();

        let err = f.engagement.like(&session("ghost"), post_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = f
            .engagement
            .comment(&session("ghost"), post_id, "hello")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        assert_eq!(f.likes.like_count(post_id), 0);
        assert!(f.comments.comments().is_empty());
    }

    #[tokio::test]
    async fn without_session_nothing_is_liked() {
        let f = fixture(InMemoryProfileStore::new());
        let liked = f.engagement.is_liked(None, PostId::new()).await.unwrap();
        assert!(!liked);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_before_storing() {
        let f = fixture(InMemoryProfileStore::new().with_profile("reader", Role::User));

        let err = f
            .engagement
            .comment(&session("reader"), PostId::new(), "   ")
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(f.comments.comments().is_empty());
    }

    #[tokio::test]
    async fn admin_comment_is_stored_trimmed() {
        let f = fixture(InMemoryProfileStore::new().with_profile("editor", Role::Admin));
        let post_id = PostId::new();

        let stored = f
            .engagement
            .comment(&session("editor"), post_id, "  Thanks all ")
            .await
            .unwrap();

        assert_eq!(stored.content, "Thanks all");
        assert_eq!(f.comments.comments(), vec![stored]);
    }

    #[tokio::test]
    async fn reader_without_profile_may_comment() {
        let f = fixture(InMemoryProfileStore::new());

        let result = f
            .engagement
            .comment(&session("newcomer"), PostId::new(), "first!")
            .await;

        assert!(result.is_ok());
    }
}
