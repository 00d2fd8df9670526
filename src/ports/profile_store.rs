//! ProfileStore port for the external `profiles` table.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::auth::{ProfileRecord, Session};

/// Failures reported by the profile store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileStoreError {
    /// No row matches the requested user id.
    #[error("Profile not found")]
    NotFound,

    /// A row with this user id already exists.
    #[error("Profile already exists")]
    Conflict,

    /// The store answered with an error of its own.
    #[error("Profile store rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The store could not be reached or answered unexpectedly.
    #[error("Profile store unavailable: {0}")]
    Unavailable(String),
}

impl ProfileStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfileStoreError::NotFound)
    }
}

/// Reads and lazily creates profile rows.
///
/// Both calls act on behalf of `caller`: the row is keyed by the caller's
/// user id, and the store authorises as the caller so row-level rules
/// apply to the signed-in user.
///
/// # Contract
///
/// - `find_by_id` returns `ProfileStoreError::NotFound` (and only that
///   variant) when no row exists.
/// - `insert` returns `ProfileStoreError::Conflict` when a row with the
///   same id already exists.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_id(&self, caller: &Session) -> Result<ProfileRecord, ProfileStoreError>;

    async fn insert(
        &self,
        caller: &Session,
        profile: &ProfileRecord,
    ) -> Result<(), ProfileStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_recognised() {
        assert!(ProfileStoreError::NotFound.is_not_found());
        assert!(!ProfileStoreError::Conflict.is_not_found());
        assert!(!ProfileStoreError::unavailable("down").is_not_found());
    }

    #[test]
    fn rejected_displays_code() {
        let err = ProfileStoreError::Rejected {
            code: "42501".into(),
            message: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "Profile store rejected request (42501): permission denied"
        );
    }
}
