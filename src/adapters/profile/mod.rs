//! Profile store adapters.
//!
//! - `postgrest` - Hosted `profiles` table over PostgREST
//! - `in_memory` - HashMap-backed store for tests and local runs

mod in_memory;
mod postgrest;

pub use in_memory::InMemoryProfileStore;
pub use postgrest::PostgrestProfileStore;
