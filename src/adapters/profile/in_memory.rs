//! In-memory profile store for testing.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. This adapter is for
//! tests and local development only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::auth::{ProfileRecord, Role, Session};
use crate::domain::foundation::UserId;
use crate::ports::{ProfileStore, ProfileStoreError};

/// Profile table kept in a `HashMap`.
///
/// Besides storage it can force errors, count calls, remember which access
/// tokens it was called with and hold inserts behind a gate so tests can
/// observe what happens while creation is in flight.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryProfileStore::new().with_profile("u1", Role::Admin);
/// let row = store.find_by_id(&session_for("u1")).await?;
/// assert_eq!(row.role(), Role::Admin);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    rows: RwLock<HashMap<UserId, ProfileRecord>>,
    find_error: RwLock<Option<ProfileStoreError>>,
    insert_error: RwLock<Option<ProfileStoreError>>,
    insert_gate: RwLock<Option<Arc<Notify>>>,
    tokens: RwLock<Vec<String>>,
    finds: AtomicUsize,
    inserts: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row with a well-formed role.
    pub fn with_profile(self, user_id: impl Into<String>, role: Role) -> Self {
        self.with_raw_role(user_id, role.as_str())
    }

    /// Seeds a row whose `role` column holds an arbitrary string.
    pub fn with_raw_role(self, user_id: impl Into<String>, role: impl Into<String>) -> Self {
        let id = UserId::new(user_id).expect("test user id must not be empty");
        let row = ProfileRecord {
            id: id.clone(),
            email: None,
            role: role.into(),
        };
        self.rows
            .write()
            .expect("InMemoryProfileStore: lock poisoned")
            .insert(id, row);
        self
    }

    /// Makes every `find_by_id` fail with `error`.
    pub fn with_find_error(self, error: ProfileStoreError) -> Self {
        *self
            .find_error
            .write()
            .expect("InMemoryProfileStore: lock poisoned") = Some(error);
        self
    }

    /// Makes every `insert` fail with `error`.
    pub fn with_insert_error(self, error: ProfileStoreError) -> Self {
        *self
            .insert_error
            .write()
            .expect("InMemoryProfileStore: lock poisoned") = Some(error);
        self
    }

    /// Holds every subsequent insert until the returned gate is notified.
    /// Each `notify_one` releases one insert.
    pub fn hold_inserts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self
            .insert_gate
            .write()
            .expect("InMemoryProfileStore: lock poisoned") = Some(gate.clone());
        gate
    }

    pub fn get(&self, user_id: &str) -> Option<ProfileRecord> {
        self.rows
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .values()
            .find(|row| row.id.as_str() == user_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access tokens of every caller so far, in call order.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.tokens
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .clone()
    }

    fn remember(&self, caller: &Session) {
        self.tokens
            .write()
            .expect("InMemoryProfileStore: lock poisoned")
            .push(caller.access_token.clone());
    }

    /// Number of `find_by_id` calls so far.
    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    /// Number of `insert` calls so far, including failed ones.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_id(&self, caller: &Session) -> Result<ProfileRecord, ProfileStoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.remember(caller);

        if let Some(error) = self
            .find_error
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .clone()
        {
            return Err(error);
        }

        self.rows
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .get(caller.user_id())
            .cloned()
            .ok_or(ProfileStoreError::NotFound)
    }

    async fn insert(
        &self,
        caller: &Session,
        profile: &ProfileRecord,
    ) -> Result<(), ProfileStoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.remember(caller);

        let gate = self
            .insert_gate
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self
            .insert_error
            .read()
            .expect("InMemoryProfileStore: lock poisoned")
            .clone()
        {
            return Err(error);
        }

        let mut rows = self
            .rows
            .write()
            .expect("InMemoryProfileStore: lock poisoned");
        if rows.contains_key(&profile.id) {
            return Err(ProfileStoreError::Conflict);
        }
        rows.insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: &str) -> Session {
        Session::new(UserId::new(id).unwrap(), None, format!("token-{}", id))
    }

    fn user_row(id: &str) -> ProfileRecord {
        ProfileRecord::new(UserId::new(id).unwrap(), None, Role::User)
    }

    #[tokio::test]
    async fn find_missing_row_is_not_found() {
        let store = InMemoryProfileStore::new();
        let err = store.find_by_id(&caller("nobody")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.find_count(), 1);
    }

    #[tokio::test]
    async fn seeded_row_is_found() {
        let store = InMemoryProfileStore::new().with_profile("u1", Role::Admin);
        let row = store.find_by_id(&caller("u1")).await.unwrap();
        assert_eq!(row.role(), Role::Admin);
    }

    #[tokio::test]
    async fn raw_role_is_kept_verbatim() {
        let store = InMemoryProfileStore::new().with_raw_role("u1", "superuser");
        let row = store.find_by_id(&caller("u1")).await.unwrap();
        assert_eq!(row.role, "superuser");
        assert_eq!(row.role(), Role::User);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = InMemoryProfileStore::new();
        let row = user_row("u1");

        store.insert(&caller("u1"), &row).await.unwrap();
        assert_eq!(
            store.insert(&caller("u1"), &row).await,
            Err(ProfileStoreError::Conflict)
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.insert_count(), 2);
    }

    #[tokio::test]
    async fn forced_errors_are_returned() {
        let store = InMemoryProfileStore::new()
            .with_find_error(ProfileStoreError::unavailable("down"))
            .with_insert_error(ProfileStoreError::unavailable("down"));

        assert!(store.find_by_id(&caller("u1")).await.is_err());
        assert!(store.insert(&caller("u1"), &user_row("u1")).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn callers_tokens_are_remembered() {
        let store = InMemoryProfileStore::new();

        let _ = store.find_by_id(&caller("u1")).await;
        store.insert(&caller("u1"), &user_row("u1")).await.unwrap();

        assert_eq!(store.seen_tokens(), vec!["token-u1", "token-u1"]);
    }

    #[tokio::test]
    async fn held_insert_waits_for_gate() {
        let store = Arc::new(InMemoryProfileStore::new());
        let gate = store.hold_inserts();

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.insert(&caller("u1"), &user_row("u1")).await }
        });

        tokio::task::yield_now().await;
        assert!(store.get("u1").is_none());

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert!(store.get("u1").is_some());
    }
}
