//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use promptflow_core::http::CallOptions;
use promptflow_core::protocol::{CompletionFailure, CompletionResult, ConnectionStatus, TokenUsage};
use promptflow_core::providers::ProviderAdapter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary (`RUST_LOG` filters it)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A call received by [`ScriptedAdapter`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model_id: String,
    pub temperature: f32,
    pub request_id: String,
    pub timeout: Duration,
}

/// Adapter double that records calls and replays scripted results
///
/// When the script runs out it answers `reply:<user prompt>`.
pub struct ScriptedAdapter {
    provider: &'static str,
    script: Mutex<VecDeque<CompletionResult>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAdapter {
    pub fn new(provider: &'static str) -> Arc<Self> {
        Arc::new(Self {
            provider,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, result: CompletionResult) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn push_text(&self, text: &str) {
        self.push(CompletionResult::success(text, TokenUsage::summed(3, 4), "scripted-model"));
    }

    pub fn push_failure(&self, failure: CompletionFailure) {
        self.push(failure.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider_id(&self) -> &str {
        self.provider
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn generate_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model_id: &str,
        temperature: f32,
        options: &CallOptions,
    ) -> CompletionResult {
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            model_id: model_id.to_string(),
            temperature,
            request_id: options.request_id.to_string(),
            timeout: options.timeout,
        });

        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            CompletionResult::success(
                format!("reply:{}", user_prompt),
                TokenUsage::summed(1, 1),
                "scripted-model",
            )
        })
    }

    async fn test_connection(&self, _options: &CallOptions) -> ConnectionStatus {
        ConnectionStatus::connected("ok")
    }
}
