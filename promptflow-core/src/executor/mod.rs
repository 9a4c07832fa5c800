//! Function execution
//!
//! Runs one [`FunctionDef`] against a [`VariableContext`]: checks that the
//! function is enabled and that its required inputs are present, resolves both
//! prompts and hands them to the [`ProviderDispatcher`]. Nothing is sent over
//! the network for a skipped or rejected function.

use crate::http::CallOptions;
use crate::protocol::types::{CompletionFailure, CompletionResult, FunctionDef, VariableContext};
use crate::providers::ProviderDispatcher;
use crate::template;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of running a single function
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The function is disabled; nothing was called
    Skipped { function: String },

    /// Required inputs were missing; carries a `Validation` failure
    Rejected(CompletionResult),

    /// The dispatcher's result, unchanged
    Completed(CompletionResult),
}

impl ExecutionResult {
    /// The underlying completion result, if the function was not skipped
    pub fn completion(&self) -> Option<&CompletionResult> {
        match self {
            Self::Skipped { .. } => None,
            Self::Rejected(result) | Self::Completed(result) => Some(result),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Completed with a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(result) if result.is_success())
    }

    /// Generated text of a successful completion
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed(result) => result.text(),
            _ => None,
        }
    }
}

/// Required input names (dotted paths allowed) not defined in `context`
pub fn missing_inputs(function: &FunctionDef, context: &VariableContext) -> Vec<String> {
    function
        .required_inputs
        .iter()
        .filter(|input| !context.is_defined(input))
        .cloned()
        .collect()
}

/// Executes functions through a shared dispatcher
#[derive(Clone)]
pub struct FunctionExecutor {
    dispatcher: Arc<ProviderDispatcher>,
}

impl FunctionExecutor {
    pub fn new(dispatcher: Arc<ProviderDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &ProviderDispatcher {
        &self.dispatcher
    }

    /// Run `function` with the dispatcher's default call options
    pub async fn run(&self, function: &FunctionDef, context: &VariableContext) -> ExecutionResult {
        self.run_with(function, context, &self.dispatcher.call_options())
            .await
    }

    /// Run `function` with caller-supplied call options
    pub async fn run_with(
        &self,
        function: &FunctionDef,
        context: &VariableContext,
        options: &CallOptions,
    ) -> ExecutionResult {
        if !function.enabled {
            debug!(function = %function.name, "function disabled, skipping");
            return ExecutionResult::Skipped {
                function: function.name.clone(),
            };
        }

        let missing = missing_inputs(function, context);
        if !missing.is_empty() {
            warn!(
                function = %function.name,
                missing = ?missing,
                "required inputs missing, not dispatching"
            );
            return ExecutionResult::Rejected(
                CompletionFailure::validation(format!(
                    "Missing required inputs: {}",
                    missing.join(", ")
                ))
                .into(),
            );
        }

        let tmpl = &function.prompt_template;
        let system_prompt = template::resolve(&tmpl.system_prompt, context);
        let user_prompt = template::resolve(&tmpl.user_prompt, context);

        info!(
            request_id = %options.request_id,
            function = %function.name,
            model_id = %tmpl.model,
            "executing function"
        );

        let result = self
            .dispatcher
            .dispatch_resolved(
                &system_prompt,
                &user_prompt,
                &tmpl.model,
                tmpl.temperature,
                options,
            )
            .await;

        ExecutionResult::Completed(result)
    }
}
