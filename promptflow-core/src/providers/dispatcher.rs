//! Provider dispatch
//!
//! Selects the adapter serving a logical model id through the model registry
//! and forwards the call. The dispatcher holds a capability table of adapters
//! keyed by provider id; it performs no retries and never raises.

use crate::config::ProviderSettings;
use crate::http::client::HttpClient;
use crate::http::CallOptions;
use crate::protocol::types::{
    CompletionFailure, CompletionResult, ConnectionStatus, PromptData, ProviderId,
};
use crate::providers::adapter::ProviderAdapter;
use crate::providers::anthropic::AnthropicAdapter;
use crate::providers::error::{ProviderResult, ProviderSetupError};
use crate::providers::openai::OpenAIAdapter;
use crate::registry::ModelRegistry;
use crate::template;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Routes completion calls to the adapter registered for a model's provider
pub struct ProviderDispatcher {
    registry: Arc<ModelRegistry>,
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
    timeout: Duration,
}

impl ProviderDispatcher {
    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Build a dispatcher with an adapter for every provider that has credentials
    pub fn from_settings(settings: &ProviderSettings) -> ProviderResult<Self> {
        let http = HttpClient::with_config(
            Duration::from_millis(settings.connection.connect_timeout_ms),
            settings.connection.max_idle_per_host,
        )
        .map_err(ProviderSetupError::HttpClient)?;

        let mut builder = Self::builder()
            .timeout(Duration::from_millis(settings.connection.request_timeout_ms));

        if let Some(endpoint) = &settings.openai {
            debug!(provider = "openai", api_key = %endpoint.api_key.partial_redact(), "configuring adapter");
            builder = builder.adapter(Arc::new(OpenAIAdapter::new(endpoint, http.clone())?));
        }
        if let Some(endpoint) = &settings.anthropic {
            debug!(provider = "anthropic", api_key = %endpoint.api_key.partial_redact(), "configuring adapter");
            builder = builder.adapter(Arc::new(AnthropicAdapter::new(endpoint, http.clone())?));
        }

        Ok(builder.build())
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Registered provider ids, sorted
    pub fn providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = self.adapters.keys().cloned().collect();
        providers.sort();
        providers
    }

    /// Default call options for this dispatcher
    pub fn call_options(&self) -> CallOptions {
        CallOptions::new().with_timeout(self.timeout)
    }

    /// Resolve both prompt fields against `data.variables` and dispatch
    pub async fn dispatch(&self, data: &PromptData) -> CompletionResult {
        self.dispatch_with(data, &self.call_options()).await
    }

    /// [`dispatch`](Self::dispatch) with caller-supplied call options
    pub async fn dispatch_with(&self, data: &PromptData, options: &CallOptions) -> CompletionResult {
        let system_prompt = template::resolve(&data.system_prompt, &data.variables);
        let user_prompt = template::resolve(&data.user_prompt, &data.variables);

        self.dispatch_resolved(
            &system_prompt,
            &user_prompt,
            &data.model,
            data.temperature,
            options,
        )
        .await
    }

    /// Forward already-resolved prompts to the adapter serving `model_id`
    pub async fn dispatch_resolved(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model_id: &str,
        temperature: f32,
        options: &CallOptions,
    ) -> CompletionResult {
        let provider = self.registry.provider_for(model_id);
        if !self.registry.contains(model_id) {
            debug!(model_id, provider, "unknown model id, using fallback provider");
        }

        let Some(adapter) = self.adapters.get(provider) else {
            warn!(model_id, provider, "no adapter registered for provider");
            return CompletionFailure::configuration(format!(
                "No adapter registered for provider '{}' (model '{}')",
                provider, model_id
            ))
            .into();
        };

        info!(
            request_id = %options.request_id,
            model_id,
            provider,
            "dispatching completion"
        );

        adapter
            .generate_completion(system_prompt, user_prompt, model_id, temperature, options)
            .await
    }

    /// Test every registered adapter
    pub async fn test_connections(&self) -> BTreeMap<ProviderId, ConnectionStatus> {
        let mut results = BTreeMap::new();
        for provider in self.providers() {
            if let Some(adapter) = self.adapters.get(&provider) {
                let status = adapter.test_connection(&self.call_options()).await;
                results.insert(provider, status);
            }
        }
        results
    }
}

/// Builder for [`ProviderDispatcher`]
pub struct DispatcherBuilder {
    registry: Option<Arc<ModelRegistry>>,
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
    timeout: Duration,
}

impl DispatcherBuilder {
    /// Create a new dispatcher builder
    pub fn new() -> Self {
        Self {
            registry: None,
            adapters: HashMap::new(),
            timeout: crate::http::DEFAULT_TIMEOUT,
        }
    }

    /// Use a custom model registry (defaults to [`ModelRegistry::default`])
    pub fn registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register an adapter under its own provider id, replacing any previous one
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters
            .insert(adapter.provider_id().to_string(), adapter);
        self
    }

    /// Default per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> ProviderDispatcher {
        ProviderDispatcher {
            registry: self.registry.unwrap_or_default(),
            adapters: self.adapters,
            timeout: self.timeout,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
