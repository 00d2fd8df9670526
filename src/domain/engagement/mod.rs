//! Reader engagement on published posts: likes and comments.
//!
//! Only signed-in readers with a non-anonymous role engage; the rows carry
//! the reader's user id so the backend can check ownership.

mod comment;
mod like;

pub use comment::{NewComment, APPROVED};
pub use like::PostLike;
