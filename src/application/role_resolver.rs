//! Role Resolver.
//!
//! Maps a session to a role by reading the caller's profile row:
//!
//! | Session | Profile lookup          | Role                         |
//! |---------|-------------------------|------------------------------|
//! | none    | not attempted           | `Anonymous`                  |
//! | some    | row found               | decoded from the stored role |
//! | some    | not found               | `User`, row created detached |
//! | some    | any other failure       | `User`                       |
//!
//! Failures only ever degrade toward `User`, never toward `Admin`. Store
//! calls are made as the session's user.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::auth::{ProfileRecord, Role, Session};
use crate::domain::foundation::UserId;
use crate::ports::{ProfileStore, ProfileStoreError};

use super::BackgroundTasks;

#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn ProfileStore>,
    background: Arc<BackgroundTasks>,
    /// Users whose profile insert is currently in flight.
    creating: Arc<Mutex<HashSet<UserId>>>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn ProfileStore>, background: Arc<BackgroundTasks>) -> Self {
        Self {
            store,
            background,
            creating: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn resolve(&self, session: Option<&Session>) -> Role {
        let Some(session) = session else {
            return Role::Anonymous;
        };
        let user_id = session.user_id();

        match self.store.find_by_id(session).await {
            Ok(profile) => {
                let role = profile.role();
                tracing::debug!(user_id = %user_id, role = %role, "Resolved role from profile");
                role
            }
            Err(ProfileStoreError::NotFound) => {
                tracing::info!(user_id = %user_id, "No profile yet, creating one");
                self.create_profile(session.clone(), ProfileRecord::first_sign_in(session));
                Role::User
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Profile lookup failed, defaulting to user"
                );
                Role::User
            }
        }
    }

    /// Spawns the insert unless one for the same user is already running.
    fn create_profile(&self, caller: Session, profile: ProfileRecord) {
        let first = self
            .creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.id.clone());
        if !first {
            tracing::debug!(user_id = %profile.id, "Profile creation already in flight");
            return;
        }

        let store = self.store.clone();
        let creating = self.creating.clone();
        self.background.spawn("create_profile", async move {
            match store.insert(&caller, &profile).await {
                Ok(()) => tracing::info!(user_id = %profile.id, "Created profile"),
                Err(ProfileStoreError::Conflict) => {
                    tracing::debug!(user_id = %profile.id, "Profile already existed")
                }
                Err(e) => {
                    tracing::error!(user_id = %profile.id, error = %e, "Failed to create profile")
                }
            }
            creating
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&profile.id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::profile::InMemoryProfileStore;

    fn session(id: &str) -> Session {
        Session::new(
            UserId::new(id).unwrap(),
            Some(format!("{}@example.com", id)),
            "token",
        )
    }

    fn resolver(store: &Arc<InMemoryProfileStore>) -> (RoleResolver, Arc<BackgroundTasks>) {
        let background = Arc::new(BackgroundTasks::new());
        (
            RoleResolver::new(store.clone(), background.clone()),
            background,
        )
    }

    #[tokio::test]
    async fn no_session_is_anonymous_without_query() {
        let store = Arc::new(InMemoryProfileStore::new());
        let (resolver, _) = resolver(&store);

        assert_eq!(resolver.resolve(None).await, Role::Anonymous);
        assert_eq!(store.find_count(), 0);
    }

    #[tokio::test]
    async fn existing_row_role_is_used() {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profile("admin-1", Role::Admin)
                .with_profile("user-1", Role::User),
        );
        let (resolver, _) = resolver(&store);

        assert_eq!(resolver.resolve(Some(&session("admin-1"))).await, Role::Admin);
        assert_eq!(resolver.resolve(Some(&session("user-1"))).await, Role::User);
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn missing_row_is_created_as_user() {
        let store = Arc::new(InMemoryProfileStore::new());
        let (resolver, background) = resolver(&store);

        assert_eq!(resolver.resolve(Some(&session("u2"))).await, Role::User);
        background.drain().await;

        assert_eq!(store.insert_count(), 1);
        let row = store.get("u2").unwrap();
        assert_eq!(row.role, "user");
        assert_eq!(row.email.as_deref(), Some("u2@example.com"));
    }

    #[tokio::test]
    async fn failed_insert_still_resolves_user() {
        let store = Arc::new(
            InMemoryProfileStore::new().with_insert_error(ProfileStoreError::unavailable("down")),
        );
        let (resolver, background) = resolver(&store);

        assert_eq!(resolver.resolve(Some(&session("u2"))).await, Role::User);
        background.drain().await;
        assert_eq!(store.insert_count(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_user() {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profile("admin-1", Role::Admin)
                .with_find_error(ProfileStoreError::unavailable("timeout")),
        );
        let (resolver, background) = resolver(&store);

        assert_eq!(resolver.resolve(Some(&session("admin-1"))).await, Role::User);
        background.drain().await;
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn re_resolving_is_idempotent() {
        let store = Arc::new(InMemoryProfileStore::new());
        let (resolver, background) = resolver(&store);
        let s = session("u3");

        let first = resolver.resolve(Some(&s)).await;
        background.drain().await;
        let second = resolver.resolve(Some(&s)).await;
        background.drain().await;

        assert_eq!(first, second);
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_resolutions_insert_once() {
        let store = Arc::new(InMemoryProfileStore::new());
        let gate = store.hold_inserts();
        let (resolver, background) = resolver(&store);
        let s = session("u4");

        let (a, b) = tokio::join!(resolver.resolve(Some(&s)), resolver.resolve(Some(&s)));
        assert_eq!((a, b), (Role::User, Role::User));

        gate.notify_one();
        background.drain().await;
        assert_eq!(store.insert_count(), 1);
        assert!(store.get("u4").is_some());
    }

    #[tokio::test]
    async fn unknown_stored_role_decodes_to_user() {
        let store = Arc::new(InMemoryProfileStore::new().with_raw_role("u5", "superadmin"));
        let (resolver, _) = resolver(&store);
        assert_eq!(resolver.resolve(Some(&session("u5"))).await, Role::User);
    }

    #[tokio::test]
    async fn stored_anonymous_passes_through() {
        let store = Arc::new(InMemoryProfileStore::new().with_raw_role("u6", "anonymous"));
        let (resolver, _) = resolver(&store);
        assert_eq!(resolver.resolve(Some(&session("u6"))).await, Role::Anonymous);
    }

    #[tokio::test]
    async fn store_calls_carry_the_session_token() {
        let store = Arc::new(InMemoryProfileStore::new());
        let (resolver, background) = resolver(&store);
        let s = Session::new(UserId::new("u7").unwrap(), None, "u7-access-token");

        resolver.resolve(Some(&s)).await;
        background.drain().await;

        assert_eq!(store.seen_tokens(), vec!["u7-access-token", "u7-access-token"]);
    }
}
