//! CommentStore port for the external `comments` table.

use async_trait::async_trait;

use crate::domain::auth::Session;
use crate::domain::engagement::NewComment;
use crate::domain::foundation::DomainError;

/// Appends comments written by the caller.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn add_comment(&self, caller: &Session, comment: &NewComment) -> Result<(), DomainError>;
}
