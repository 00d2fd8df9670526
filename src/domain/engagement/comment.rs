use serde::Serialize;

use crate::domain::foundation::{PostId, UserId, ValidationError};

/// Status new comments are stored with. There is no moderation queue yet,
/// so comments are published immediately.
pub const APPROVED: &str = "approved";

/// A comment about to be inserted into the `comments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub status: &'static str,
}

impl NewComment {
    /// Builds a comment from raw input. Surrounding whitespace is trimmed;
    /// nothing else is rewritten.
    pub fn new(post_id: PostId, author_id: UserId, content: &str) -> Result<Self, ValidationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::empty_field("content"));
        }

        Ok(Self {
            post_id,
            author_id,
            content: content.to_string(),
            status: APPROVED,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> UserId {
        UserId::new("reader-1").unwrap()
    }

    #[test]
    fn content_is_trimmed_and_approved() {
        let comment = NewComment::new(PostId::new(), author(), "  Nice post!\n").unwrap();
        assert_eq!(comment.content, "Nice post!");
        assert_eq!(comment.status, "approved");
    }

    #[test]
    fn blank_content_is_rejected() {
        assert_eq!(
            NewComment::new(PostId::new(), author(), " \t\n"),
            Err(ValidationError::empty_field("content"))
        );
    }

    #[test]
    fn serializes_as_a_comments_row() {
        let post_id = PostId::new();
        let comment = NewComment::new(post_id, author(), "hi").unwrap();
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "post_id": post_id.to_string(),
                "author_id": "reader-1",
                "content": "hi",
                "status": "approved"
            })
        );
    }
}
