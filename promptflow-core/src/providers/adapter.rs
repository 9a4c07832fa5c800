//! Provider adapter trait
//!
//! Defines the capability interface every backend implements. The dispatcher
//! selects an implementation through a table keyed by provider id.

use crate::http::CallOptions;
use crate::protocol::types::{CompletionResult, ConnectionStatus};
use crate::providers::error::ProviderSetupError;
use async_trait::async_trait;

/// `max_tokens` sent with every completion request
pub const MAX_COMPLETION_TOKENS: u32 = 2000;

/// `max_tokens` sent with the connection test
pub const CONNECTION_TEST_MAX_TOKENS: u32 = 50;

/// System prompt of the connection test
pub const CONNECTION_TEST_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// User prompt of the connection test
pub const CONNECTION_TEST_USER_PROMPT: &str = "Hello, are you working?";

/// Core adapter trait that all model providers must implement
///
/// Every call performs exactly one outbound request and never raises: all
/// outcomes, including transport failures, come back as a
/// [`CompletionResult`] or [`ConnectionStatus`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider id this adapter serves (e.g. `openai`)
    fn provider_id(&self) -> &str;

    /// Provider model used when a logical model id is not in the adapter's table
    fn default_model(&self) -> &str;

    /// Generate a completion for already-resolved prompts
    ///
    /// `model_id` is the logical id; unknown ids fall back to
    /// [`default_model`](Self::default_model).
    async fn generate_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model_id: &str,
        temperature: f32,
        options: &CallOptions,
    ) -> CompletionResult;

    /// Issue a minimal low-token request to check reachability and credentials
    async fn test_connection(&self, options: &CallOptions) -> ConnectionStatus;
}

/// Validate a base URL and strip any trailing slash
pub(crate) fn normalize_base_url(provider: &str, raw: &str) -> Result<String, ProviderSetupError> {
    let parsed = url::Url::parse(raw).map_err(|e| ProviderSetupError::InvalidBaseUrl {
        provider: provider.to_string(),
        message: e.to_string(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ProviderSetupError::InvalidBaseUrl {
            provider: provider.to_string(),
            message: format!("URL scheme must be http or https, got: {}", parsed.scheme()),
        });
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("openai", "https://api.openai.com/v1/").unwrap(),
            "https://api.openai.com/v1"
        );
        assert!(matches!(
            normalize_base_url("openai", "ftp://example.com"),
            Err(ProviderSetupError::InvalidBaseUrl { .. })
        ));
        assert!(normalize_base_url("openai", "not a url").is_err());
    }
}
