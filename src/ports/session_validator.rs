//! Session validation port for bearer access tokens.
//!
//! The HTTP surface receives the access token the browser obtained from the
//! hosted auth service and turns it into a [`Session`] with this port. It is
//! provider-agnostic: the production adapter checks the backend's JWT
//! signature locally, tests use a token map.

use async_trait::async_trait;

use crate::domain::auth::{AuthError, Session};

/// Validates access tokens and extracts the session they stand for.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw access token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<Session, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct TableValidator {
        tokens: RwLock<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionValidator for TableValidator {
        async fn validate(&self, token: &str) -> Result<Session, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_maps_token_to_session() {
        let session = Session::new(UserId::new("u1").unwrap(), None, "tok");
        let validator = TableValidator {
            tokens: RwLock::new(HashMap::from([("tok".to_string(), session)])),
        };

        let found = validator.validate("tok").await.unwrap();
        assert_eq!(found.user_id().as_str(), "u1");
        assert_eq!(validator.validate("nope").await, Err(AuthError::InvalidToken));
    }

    #[test]
    fn session_validator_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SessionValidator>();
    }
}
