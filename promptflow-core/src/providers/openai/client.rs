//! OpenAI adapter implementation

use super::types::{OpenAIMessage, OpenAIRequest, OpenAIResponse};
use crate::config::ProviderEndpoint;
use crate::config::SecretString;
use crate::http::client::HttpClient;
use crate::http::CallOptions;
use crate::protocol::types::{CompletionFailure, CompletionResult, ConnectionStatus, TokenUsage};
use crate::providers::adapter::{
    normalize_base_url, ProviderAdapter, CONNECTION_TEST_MAX_TOKENS, CONNECTION_TEST_SYSTEM_PROMPT,
    CONNECTION_TEST_USER_PROMPT, MAX_COMPLETION_TOKENS,
};
use crate::providers::error::{ProviderResult, ProviderSetupError};
use crate::registry::OPENAI_PROVIDER;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, warn};

/// Default OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used for logical ids missing from the table
const DEFAULT_MODEL: &str = "gpt-4o";

/// Model used by the connection test
const CONNECTION_TEST_MODEL: &str = "o3-mini";

/// Map a logical model id to the OpenAI model name
fn provider_model_name(model_id: &str) -> &'static str {
    match model_id {
        "MODEL_GPT_4O" => "gpt-4o",
        "MODEL_GPT_4O_2024_08_06" => "gpt-4o-2024-08-06",
        "MODEL_O3_MINI" => "o3-mini",
        _ => DEFAULT_MODEL,
    }
}

/// OpenAI-style adapter
pub struct OpenAIAdapter {
    base_url: String,
    api_key: SecretString,
    http: HttpClient,
}

impl OpenAIAdapter {
    /// Create a new OpenAI adapter
    pub fn new(endpoint: &ProviderEndpoint, http: HttpClient) -> ProviderResult<Self> {
        if endpoint.api_key.is_empty() {
            return Err(ProviderSetupError::MissingApiKey {
                provider: OPENAI_PROVIDER.to_string(),
            });
        }

        let base_url = normalize_base_url(
            OPENAI_PROVIDER,
            endpoint.base_url.as_deref().unwrap_or(OPENAI_BASE_URL),
        )?;

        Ok(Self {
            base_url,
            api_key: endpoint.api_key.clone(),
            http,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build request headers
    fn build_headers(&self) -> Result<HeaderMap, CompletionFailure> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|_| {
                CompletionFailure::configuration(
                    "OpenAI API key contains characters not allowed in an HTTP header",
                )
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(
        &self,
        request: &OpenAIRequest<'_>,
        options: &CallOptions,
    ) -> Result<OpenAIResponse, CompletionFailure> {
        let url = format!("{}/chat/completions", self.base_url);
        let headers = self.build_headers()?;
        self.http.post_json(&url, headers, request, options).await
    }
}

/// Text of the first choice
fn first_choice_text(response: OpenAIResponse) -> Result<(String, TokenUsage), CompletionFailure> {
    let usage = response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    let choice = response.choices.into_iter().next().ok_or_else(|| {
        CompletionFailure::provider(200, "Invalid response format: no choices returned", None)
    })?;

    let text = choice.message.content.ok_or_else(|| {
        CompletionFailure::provider(
            200,
            "Invalid response format: no message content returned",
            choice
                .finish_reason
                .map(|reason| serde_json::json!({ "finish_reason": reason })),
        )
    })?;

    Ok((text, usage))
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
    fn provider_id(&self) -> &str {
        OPENAI_PROVIDER
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
        debug!(request_id = %options.request_id, model_id, model, "openai completion");

        let request = OpenAIRequest {
            model,
            messages: vec![
                OpenAIMessage::system(system_prompt),
                OpenAIMessage::user(user_prompt),
            ],
            temperature: Some(temperature),
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        match self.send(&request, options).await.and_then(first_choice_text) {
            Ok((text, usage)) => {
                info!(
                    request_id = %options.request_id,
                    total_tokens = usage.total_tokens,
                    "openai completion succeeded"
                );
                CompletionResult::success(text, usage, model)
            }
            Err(failure) => {
                warn!(request_id = %options.request_id, "openai completion failed: {}", failure);
                CompletionResult::Failure(failure)
            }
        }
    }

    async fn test_connection(&self, options: &CallOptions) -> ConnectionStatus {
        let request = OpenAIRequest {
            model: CONNECTION_TEST_MODEL,
            messages: vec![
                OpenAIMessage::system(CONNECTION_TEST_SYSTEM_PROMPT),
                OpenAIMessage::user(CONNECTION_TEST_USER_PROMPT),
            ],
            temperature: None,
            max_tokens: CONNECTION_TEST_MAX_TOKENS,
        };

        match self.send(&request, options).await.and_then(first_choice_text) {
            Ok((text, _)) => ConnectionStatus::connected(text),
            Err(failure) => {
                warn!(request_id = %options.request_id, "openai connection test failed: {}", failure);
                ConnectionStatus::failed(failure.message)
            }
        }
    }
}
