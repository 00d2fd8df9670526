//! Like and comment adapters.
//!
//! - `postgrest` - the hosted `post_likes` and `comments` tables
//! - `in_memory` - test implementations with forced errors

mod in_memory;
mod postgrest;

pub use in_memory::{InMemoryCommentStore, InMemoryLikeStore};
pub use postgrest::{PostgrestCommentStore, PostgrestLikeStore};
