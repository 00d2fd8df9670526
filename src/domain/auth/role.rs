//! Authorization roles.

use serde::{Deserialize, Serialize};

/// Authorization level of the caller.
///
/// `Anonymous` is the value held whenever there is no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[default]
    Anonymous,
}

impl Role {
    /// Decodes a role value read from a profile row.
    ///
    /// Profile rows are edited outside this application, so any value other
    /// than the three known roles decodes to `User`, never to `Admin`.
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "user" => Role::User,
            "anonymous" => Role::Anonymous,
            other => {
                tracing::warn!(stored_role = %other, "Unknown stored role, using 'user'");
                Role::User
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Anonymous => "anonymous",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
