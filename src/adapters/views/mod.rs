//! Post view recorders.
//!
//! - `PostgrestViewRecorder` - appends to the hosted `post_views` table and
//!   calls the `increment_post_views` function
//! - `InMemoryViewRecorder` - keeps views and counters in memory for tests

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;

use crate::adapters::supabase::{PostgrestClient, PostgrestError};
use crate::domain::auth::Session;
use crate::domain::foundation::{DomainError, ErrorCode, PostId};
use crate::ports::{PostView, ViewRecorder};

const TABLE: &str = "post_views";
const INCREMENT_FUNCTION: &str = "increment_post_views";

#[derive(Serialize)]
struct IncrementArgs {
    post_id: PostId,
}

pub struct PostgrestViewRecorder {
    client: PostgrestClient,
}

impl PostgrestViewRecorder {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

fn backend_error(action: &str, post_id: PostId, err: PostgrestError) -> DomainError {
    DomainError::new(ErrorCode::BackendError, format!("Failed to {}: {}", action, err))
        .with_detail("post_id", post_id.to_string())
}

#[async_trait]
impl ViewRecorder for PostgrestViewRecorder {
    async fn record_view(
        &self,
        caller: Option<&Session>,
        view: &PostView,
    ) -> Result<(), DomainError> {
        self.client
            .for_caller(caller)
            .insert(TABLE, view)
            .await
            .map_err(|e| backend_error("record view", view.post_id, e))
    }

    async fn increment_views(
        &self,
        caller: Option<&Session>,
        post_id: PostId,
    ) -> Result<(), DomainError> {
        self.client
            .for_caller(caller)
            .rpc(INCREMENT_FUNCTION, &IncrementArgs { post_id })
            .await
            .map_err(|e| backend_error("increment view count", post_id, e))
    }
}

/// In-memory recorder for tests.
///
/// # Panics
///
/// Methods may panic if an internal lock is poisoned.
#[derive(Debug, Default)]
pub struct InMemoryViewRecorder {
    views: RwLock<Vec<PostView>>,
    counters: RwLock<HashMap<PostId, u64>>,
    force_error: RwLock<Option<DomainError>>,
}

impl InMemoryViewRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes both calls fail with `error`.
    pub fn with_error(self, error: DomainError) -> Self {
        *self
            .force_error
            .write()
            .expect("InMemoryViewRecorder: lock poisoned") = Some(error);
        self
    }

    pub fn recorded(&self) -> Vec<PostView> {
        self.views
            .read()
            .expect("InMemoryViewRecorder: lock poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.views
            .read()
            .expect("InMemoryViewRecorder: lock poisoned")
            .len()
    }

    /// Current value of a post's view counter.
    pub fn views_of(&self, post_id: PostId) -> u64 {
        self.counters
            .read()
            .expect("InMemoryViewRecorder: lock poisoned")
            .get(&post_id)
            .copied()
            .unwrap_or(0)
    }

    fn forced_error(&self) -> Result<(), DomainError> {
        match self
            .force_error
            .read()
            .expect("InMemoryViewRecorder: lock poisoned")
            .clone()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ViewRecorder for InMemoryViewRecorder {
    async fn record_view(
        &self,
        _caller: Option<&Session>,
        view: &PostView,
    ) -> Result<(), DomainError> {
        self.forced_error()?;
        self.views
            .write()
            .expect("InMemoryViewRecorder: lock poisoned")
            .push(view.clone());
        Ok(())
    }

    async fn increment_views(
        &self,
        _caller: Option<&Session>,
        post_id: PostId,
    ) -> Result<(), DomainError> {
        self.forced_error()?;
        *self
            .counters
            .write()
            .expect("InMemoryViewRecorder: lock poisoned")
            .entry(post_id)
            .or_insert(0) += 1;
        Ok(())
    }
}
