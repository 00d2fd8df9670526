//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Base path must start with '/' and not end with one")]
    InvalidBasePath,

    #[error("Invalid backend URL format")]
    InvalidBackendUrl,

    #[error("Backend URL must use HTTPS in production")]
    BackendMustBeHttps,

    #[error("JWT secret must be at least 32 characters")]
    JwtSecretTooShort,
}
