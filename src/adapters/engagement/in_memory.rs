//! In-memory like and comment stores for tests.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::auth::Session;
use crate::domain::engagement::NewComment;
use crate::domain::foundation::{DomainError, PostId, UserId};
use crate::ports::{CommentStore, LikeStore};

/// Likes kept as `(post, user)` pairs.
#[derive(Default)]
pub struct InMemoryLikeStore {
    likes: RwLock<HashSet<(PostId, UserId)>>,
    force_error: RwLock<Option<DomainError>>,
}

impl InMemoryLikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(self, error: DomainError) -> Self {
        *self
            .force_error
            .write()
            .expect("InMemoryLikeStore: lock poisoned") = Some(error);
        self
    }

    pub fn like_count(&self, post_id: PostId) -> usize {
        self.likes
            .read()
            .expect("InMemoryLikeStore: lock poisoned")
            .iter()
            .filter(|(post, _)| *post == post_id)
            .count()
    }

    fn forced_error(&self) -> Result<(), DomainError> {
        match self
            .force_error
            .read()
            .expect("InMemoryLikeStore: lock poisoned")
            .clone()
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LikeStore for InMemoryLikeStore {
    async fn is_liked(&self, caller: &Session, post_id: PostId) -> Result<bool, DomainError> {
        self.forced_error()?;
        Ok(self
            .likes
            .read()
            .expect("InMemoryLikeStore: lock poisoned")
            .contains(&(post_id, caller.user_id().clone())))
    }

    async fn like(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        self.forced_error()?;
        self.likes
            .write()
            .expect("InMemoryLikeStore: lock poisoned")
            .insert((post_id, caller.user_id().clone()));
        Ok(())
    }

    async fn unlike(&self, caller: &Session, post_id: PostId) -> Result<(), DomainError> {
        self.forced_error()?;
        self.likes
            .write()
            .expect("InMemoryLikeStore: lock poisoned")
            .remove(&(post_id, caller.user_id().clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCommentStore {
    comments: RwLock<Vec<NewComment>>,
    force_error: RwLock<Option<DomainError>>,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(self, error: DomainError) -> Self {
        *self
            .force_error
            .write()
            .expect("InMemoryCommentStore: lock poisoned") = Some(error);
        self
    }

    pub fn comments(&self) -> Vec<NewComment> {
        self.comments
            .read()
            .expect("InMemoryCommentStore: lock poisoned")
            .clone()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn add_comment(
        &self,
        _caller: &Session,
        comment: &NewComment,
    ) -> Result<(), DomainError> {
        if let Some(e) = self
            .force_error
            .read()
            .expect("InMemoryCommentStore: lock poisoned")
            .clone()
        {
            return Err(e);
        }
        self.comments
            .write()
            .expect("InMemoryCommentStore: lock poisoned")
            .push(comment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn reader(id: &str) -> Session {
        Session::new(UserId::new(id).unwrap(), None, format!("token-{}", id))
    }

    #[tokio::test]
    async fn like_and_unlike_are_idempotent() {
        let store = InMemoryLikeStore::new();
        let post_id = PostId::new();
        let alice = reader("alice");

        store.like(&alice, post_id).await.unwrap();
        store.like(&alice, post_id).await.unwrap();
        assert_eq!(store.like_count(post_id), 1);
        assert!(store.is_liked(&alice, post_id).await.unwrap());

        store.unlike(&alice, post_id).await.unwrap();
        store.unlike(&alice, post_id).await.unwrap();
        assert_eq!(store.like_count(post_id), 0);
    }

    #[tokio::test]
    async fn likes_belong_to_each_reader() {
        let store = InMemoryLikeStore::new();
        let post_id = PostId::new();

        store.like(&reader("alice"), post_id).await.unwrap();

        assert!(!store.is_liked(&reader("bob"), post_id).await.unwrap());
        assert_eq!(store.like_count(post_id), 1);
    }

    #[tokio::test]
    async fn forced_error_is_returned() {
        let store = InMemoryLikeStore::new()
            .with_error(DomainError::new(ErrorCode::BackendError, "down"));

        let err = store.like(&reader("alice"), PostId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BackendError);
    }

    #[tokio::test]
    async fn comments_are_kept_in_order() {
        let store = InMemoryCommentStore::new();
        let alice = reader("alice");
        let post_id = PostId::new();
        let first = NewComment::new(post_id, alice.user_id().clone(), "first").unwrap();
        let second = NewComment::new(post_id, alice.user_id().clone(), "second").unwrap();

        store.add_comment(&alice, &first).await.unwrap();
        store.add_comment(&alice, &second).await.unwrap();

        assert_eq!(store.comments(), vec![first, second]);
    }
}
