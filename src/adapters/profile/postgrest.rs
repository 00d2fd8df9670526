//! PostgREST adapter for the `profiles` table.
//!
//! Every call authorises as the caller, so the backend's row-level rules
//! decide what the signed-in user may read and create.

use async_trait::async_trait;

use crate::adapters::supabase::{PostgrestClient, PostgrestError};
use crate::domain::auth::{ProfileRecord, Session};
use crate::ports::{ProfileStore, ProfileStoreError};

const TABLE: &str = "profiles";
const COLUMNS: &str = "id,email,role";

/// `ProfileStore` over the hosted `profiles` table.
pub struct PostgrestProfileStore {
    client: PostgrestClient,
}

impl PostgrestProfileStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileStore for PostgrestProfileStore {
    async fn find_by_id(&self, caller: &Session) -> Result<ProfileRecord, ProfileStoreError> {
        self.client
            .for_caller(Some(caller))
            .select_single(TABLE, COLUMNS, &[("id", caller.user_id().as_str())])
            .await
            .map_err(into_store_error)
    }

    async fn insert(
        &self,
        caller: &Session,
        profile: &ProfileRecord,
    ) -> Result<(), ProfileStoreError> {
        self.client
            .for_caller(Some(caller))
            .insert(TABLE, profile)
            .await
            .map_err(into_store_error)
    }
}

fn into_store_error(err: PostgrestError) -> ProfileStoreError {
    if err.is_no_rows() {
        return ProfileStoreError::NotFound;
    }
    if err.is_unique_violation() {
        return ProfileStoreError::Conflict;
    }
    match err {
        PostgrestError::Api { code, message, .. } => ProfileStoreError::Rejected { code, message },
        PostgrestError::Transport(message) => ProfileStoreError::Unavailable(message),
    }
}
