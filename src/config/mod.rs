//! Application configuration module
//!
//! Configuration is loaded from environment variables through the `config`
//! and `dotenvy` crates, with the `PERSONAL_BLOG` prefix and `__` between
//! nested keys.
//!
//! # Example
//!
//! ```no_run
//! use personal_blog::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod backend;
mod error;
mod server;

pub use backend::BackendConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, environment, base path)
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted backend (auth + tables)
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `PERSONAL_BLOG` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `PERSONAL_BLOG__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PERSONAL_BLOG__BACKEND__URL=...` -> `backend.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PERSONAL_BLOG")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.backend.validate(&self.server.environment)?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PERSONAL_BLOG__BACKEND__URL",
        "PERSONAL_BLOG__BACKEND__ANON_KEY",
        "PERSONAL_BLOG__BACKEND__JWT_SECRET",
        "PERSONAL_BLOG__SERVER__PORT",
        "PERSONAL_BLOG__SERVER__ENVIRONMENT",
        "PERSONAL_BLOG__SERVER__BASE_PATH",
    ];

    fn set_minimal_env() {
        env::set_var("PERSONAL_BLOG__BACKEND__URL", "https://proj.supabase.co");
        env::set_var("PERSONAL_BLOG__BACKEND__ANON_KEY", "anon-key");
        env::set_var(
            "PERSONAL_BLOG__BACKEND__JWT_SECRET",
            "super-secret-jwt-token-with-at-least-32-characters",
        );
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.backend.url, "https://proj.supabase.co");
        assert_eq!(config.backend.anon_key.expose_secret(), "anon-key");
        assert!(config.backend.service_role_key.is_none());
        assert!(!config.backend.use_service_role);
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_path, "/personal-blog");
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PERSONAL_BLOG__SERVER__PORT", "3000");
        env::set_var("PERSONAL_BLOG__SERVER__ENVIRONMENT", "production");
        env::set_var("PERSONAL_BLOG__SERVER__BASE_PATH", "/");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.server.base_path, "/");
    }

    #[test]
    fn test_missing_backend_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
