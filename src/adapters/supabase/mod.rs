//! Shared plumbing for the hosted backend (Supabase: GoTrue auth + PostgREST).
//!
//! Both services sit behind one project URL. Every call carries the
//! project's anon key in the `apikey` header; table calls additionally
//! carry the caller's access token so row-level security sees the
//! signed-in user. The adapters in `auth`, `profile`, `views` and
//! `engagement` build on the [`SupabaseConfig`] defined here.

mod postgrest;
#[cfg(test)]
pub(crate) mod test_server;

pub use postgrest::{PostgrestClient, PostgrestError};

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Connection settings for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g. "https://abcd.supabase.co").
    pub url: String,

    /// Public anon key, used for auth endpoints.
    pub anon_key: SecretString,

    /// Optional service-role key. Only used by clients explicitly switched
    /// to it with [`PostgrestClient::as_service_role`].
    pub service_role_key: Option<SecretString>,

    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: SecretString::new(anon_key.into()),
            service_role_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(SecretString::new(key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL of a GoTrue endpoint, e.g. `auth_url("token")`.
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path.trim_start_matches('/'))
    }

    /// URL of a PostgREST table or view.
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), table)
    }

    /// URL of a Postgres function exposed by PostgREST.
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base(), function)
    }

    pub fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }

    /// Builds the HTTP client shared by an adapter.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
