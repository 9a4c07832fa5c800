//! Provider setup error types
//!
//! Failures while *calling* a provider are returned as data
//! ([`CompletionFailure`](crate::protocol::CompletionFailure)). The errors here
//! cover building adapters and dispatchers before any call is made.

use thiserror::Error;

/// Result type for provider setup operations
pub type ProviderResult<T> = Result<T, ProviderSetupError>;

/// Errors that can occur while constructing provider adapters
#[derive(Debug, Error)]
pub enum ProviderSetupError {
    /// No API key was configured for a provider
    #[error("Missing API key for provider '{provider}'")]
    MissingApiKey { provider: String },

    /// The configured base URL is unusable
    #[error("Invalid base URL for provider '{provider}': {message}")]
    InvalidBaseUrl { provider: String, message: String },

    /// The shared HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Model registry could not be built
    #[error("Registry error: {0}")]
    Registry(String),
}

