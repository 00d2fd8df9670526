//! Profile rows mapping a user to a persisted role.

use serde::{Deserialize, Serialize};

use super::{Role, Session};
use crate::domain::foundation::UserId;

/// A row of the external `profiles` table.
///
/// `role` is kept exactly as stored; decode it with [`ProfileRecord::role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
}

impl ProfileRecord {
    pub fn new(id: UserId, email: Option<String>, role: Role) -> Self {
        Self {
            id,
            email,
            role: role.as_str().to_string(),
        }
    }

    /// The row created for a first-time sign-in.
    pub fn first_sign_in(session: &Session) -> Self {
        Self::new(session.user.id.clone(), session.user.email.clone(), Role::User)
    }

    pub fn role(&self) -> Role {
        Role::from_stored(&self.role)
    }
}
