//! Model registry
//!
//! Maps logical model identifiers to the provider that serves them. Unknown
//! identifiers resolve to the first-registered provider so stale or
//! hand-edited model ids keep working.

use crate::protocol::types::{ModelDescriptor, ProviderId};
use crate::providers::error::{ProviderResult, ProviderSetupError};

/// Provider id of the OpenAI-style backend
pub const OPENAI_PROVIDER: &str = "openai";

/// Provider id of the Anthropic-style backend
pub const ANTHROPIC_PROVIDER: &str = "anthropic";

/// Ordered, immutable set of known models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    /// Distinct provider ids in registration order
    providers: Vec<ProviderId>,
}

impl ModelRegistry {
    /// Start building a custom registry
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::new()
    }

    /// All models in registration order
    pub fn list_models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Descriptor for a model id, if registered
    pub fn descriptor(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.descriptor(model_id).is_some()
    }

    /// Provider serving `model_id`, or the fallback provider when unknown
    pub fn provider_for(&self, model_id: &str) -> &str {
        self.descriptor(model_id)
            .map(|m| m.provider_id.as_str())
            .unwrap_or_else(|| self.fallback_provider())
    }

    /// The first-registered provider
    pub fn fallback_provider(&self) -> &str {
        &self.providers[0]
    }

    /// Distinct provider ids in registration order
    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    /// Models grouped per provider, both in registration order
    pub fn models_by_provider(&self) -> Vec<(&str, Vec<&ModelDescriptor>)> {
        self.providers
            .iter()
            .map(|provider| {
                let models = self
                    .models
                    .iter()
                    .filter(|m| &m.provider_id == provider)
                    .collect();
                (provider.as_str(), models)
            })
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builder()
            .model("MODEL_GPT_4O", "GPT-4o", OPENAI_PROVIDER)
            .model("MODEL_GPT_4O_2024_08_06", "GPT-4o (2024-08-06)", OPENAI_PROVIDER)
            .model("MODEL_O3_MINI", "o3-mini", OPENAI_PROVIDER)
            .model("MODEL_CLAUDE_3_OPUS", "Claude 3 Opus", ANTHROPIC_PROVIDER)
            .model("MODEL_CLAUDE_3_SONNET", "Claude 3 Sonnet", ANTHROPIC_PROVIDER)
            .model("MODEL_CLAUDE_3_HAIKU", "Claude 3 Haiku", ANTHROPIC_PROVIDER)
            .build()
            .expect("default registry is non-empty and has unique ids")
    }
}

/// Builder for [`ModelRegistry`]
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model
    pub fn model(
        mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        self.models
            .push(ModelDescriptor::new(id, display_name, provider_id));
        self
    }

    /// Build the registry
    pub fn build(self) -> ProviderResult<ModelRegistry> {
        if self.models.is_empty() {
            return Err(ProviderSetupError::Registry(
                "At least one model must be registered".to_string(),
            ));
        }

        let mut providers: Vec<ProviderId> = Vec::new();
        for (i, model) in self.models.iter().enumerate() {
            if self.models[..i].iter().any(|m| m.id == model.id) {
                return Err(ProviderSetupError::Registry(format!(
                    "Duplicate model id: {}",
                    model.id
                )));
            }
            if !providers.contains(&model.provider_id) {
                providers.push(model.provider_id.clone());
            }
        }

        Ok(ModelRegistry {
            models: self.models,
            providers,
        })
    }
}
