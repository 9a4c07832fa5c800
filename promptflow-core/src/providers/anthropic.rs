//! Anthropic provider implementation
//!
//! Implements the adapter for Anthropic-style Messages APIs. The system
//! prompt travels as a top-level `system` field rather than a message, and
//! usage arrives as `input_tokens`/`output_tokens` which are summed into the
//! total.

use crate::config::{ProviderEndpoint, SecretString};
use crate::http::client::HttpClient;
use crate::http::CallOptions;
use crate::protocol::types::{CompletionFailure, CompletionResult, ConnectionStatus, TokenUsage};
use crate::providers::adapter::{
    normalize_base_url, ProviderAdapter, CONNECTION_TEST_MAX_TOKENS, CONNECTION_TEST_SYSTEM_PROMPT,
    CONNECTION_TEST_USER_PROMPT, MAX_COMPLETION_TOKENS,
};
use crate::providers::error::{ProviderResult, ProviderSetupError};
use crate::registry::ANTHROPIC_PROVIDER;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default Anthropic API base URL
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Value of the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const CONNECTION_TEST_MODEL: &str = "claude-3-haiku-20240307";

fn provider_model_name(model_id: &str) -> &'static str {
    match model_id {
        "MODEL_CLAUDE_3_OPUS" => "claude-3-opus-20240229",
        "MODEL_CLAUDE_3_SONNET" => "claude-3-sonnet-20240229",
        "MODEL_CLAUDE_3_HAIKU" => "claude-3-haiku-20240307",
        _ => DEFAULT_MODEL,
    }
}

/// Anthropic Messages request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub messages: Vec<AnthropicMessage<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct AnthropicMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Anthropic Messages response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<AnthropicContentBlock>,

    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicContentBlock {
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Anthropic-style adapter
pub struct AnthropicAdapter {
    base_url: String,
    api_key: SecretString,
    http: HttpClient,
}

impl AnthropicAdapter {
    /// Create a new Anthropic adapter
    pub fn new(endpoint: &ProviderEndpoint, http: HttpClient) -> ProviderResult<Self> {
        if endpoint.api_key.is_empty() {
            return Err(ProviderSetupError::MissingApiKey {
                provider: ANTHROPIC_PROVIDER.to_string(),
            });
        }

        let base_url = normalize_base_url(
            ANTHROPIC_PROVIDER,
            endpoint.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL),
        )?;

        Ok(Self {
            base_url,
            api_key: endpoint.api_key.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self) -> Result<HeaderMap, CompletionFailure> {
        let mut key = HeaderValue::from_str(self.api_key.expose_secret()).map_err(|_| {
            CompletionFailure::configuration(
                "Anthropic API key contains characters not allowed in an HTTP header",
            )
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(
        &self,
        request: &AnthropicRequest<'_>,
        options: &CallOptions,
    ) -> Result<AnthropicResponse, CompletionFailure> {
        let url = format!("{}/messages", self.base_url);
        let headers = self.build_headers()?;
        self.http.post_json(&url, headers, request, options).await
    }
}

/// First text block plus summed usage
fn first_text_block(response: AnthropicResponse) -> Result<(String, TokenUsage), CompletionFailure> {
    let usage = response
        .usage
        .map(|u| TokenUsage::summed(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    let text = response
        .content
        .into_iter()
        .filter(|block| block.block_type.as_deref().is_none_or(|t| t == "text"))
        .find_map(|block| block.text)
        .ok_or_else(|| {
            CompletionFailure::provider(200, "Invalid response format: no text content returned", None)
        })?;

    Ok((text, usage))
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_id(&self) -> &str {
        ANTHROPIC_PROVIDER
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model_id: &str,
        temperature: f32,
        options: &CallOptions,
    ) -> CompletionResult {
        let model = provider_model_name(model_id);
        debug!(request_id = %options.request_id, model_id, model, "anthropic completion");

        let request = AnthropicRequest {
            model,
            system: system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: user_prompt,
            }],
            temperature: Some(temperature),
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        match self.send(&request, options).await.and_then(first_text_block) {
            Ok((text, usage)) => {
                info!(
                    request_id = %options.request_id,
                    total_tokens = usage.total_tokens,
                    "anthropic completion succeeded"
                );
                CompletionResult::success(text, usage, model)
            }
            Err(failure) => {
                warn!(request_id = %options.request_id, "anthropic completion failed: {}", failure);
                CompletionResult::Failure(failure)
            }
        }
    }

    async fn test_connection(&self, options: &CallOptions) -> ConnectionStatus {
        let request = AnthropicRequest {
            model: CONNECTION_TEST_MODEL,
            system: CONNECTION_TEST_SYSTEM_PROMPT,
            messages: vec![AnthropicMessage {
                role: "user",
                content: CONNECTION_TEST_USER_PROMPT,
            }],
            temperature: None,
            max_tokens: CONNECTION_TEST_MAX_TOKENS,
        };

        match self.send(&request, options).await.and_then(first_text_block) {
            Ok((text, _)) => ConnectionStatus::connected(text),
            Err(failure) => {
                warn!(request_id = %options.request_id, "anthropic connection test failed: {}", failure);
                ConnectionStatus::failed(failure.message)
            }
        }
    }
}
