//! Hosted backend configuration (auth + tables)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::supabase::SupabaseConfig;

const MIN_JWT_SECRET_LEN: usize = 32;

/// Backend project settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,

    /// Public anon key
    pub anon_key: SecretString,

    /// Service-role key. Table calls only use it when `use_service_role`
    /// is set; otherwise they act as the caller.
    #[serde(default)]
    pub service_role_key: Option<SecretString>,

    /// Make table calls with the service-role key, bypassing row-level
    /// security for every caller
    #[serde(default)]
    pub use_service_role: bool,

    /// Secret access tokens are signed with
    pub jwt_secret: SecretString,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connection settings for the backend adapters.
    pub fn supabase(&self) -> SupabaseConfig {
        let anon_key = self.anon_key.expose_secret().clone();
        let mut config =
            SupabaseConfig::new(self.url.clone(), anon_key).with_timeout(self.request_timeout());
        if let Some(key) = &self.service_role_key {
            config = config.with_service_role_key(key.expose_secret().clone());
        }
        config
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__URL"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidBackendUrl);
        }
        if *environment == Environment::Production && !self.url.starts_with("https://") {
            return Err(ValidationError::BackendMustBeHttps);
        }
        if self.anon_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__ANON_KEY"));
        }
        if self.use_service_role && self.service_role_key.is_none() {
            return Err(ValidationError::MissingRequired("BACKEND__SERVICE_ROLE_KEY"));
        }
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    10
}
