//! Ordered multi-function runs
//!
//! [`PipelineRunner`] executes a document's functions one at a time in
//! `order`, writing each successful result back into the context so later
//! prompts can reference it.

use crate::config::ConfigDocument;
use crate::executor::{ExecutionResult, FunctionExecutor};
use crate::http::CallOptions;
use crate::protocol::types::{CompletionResult, FunctionDef, VariableContext, VariableValue};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How a successful result is written into the context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputBinding {
    /// `context[output_field] = text`, consumed as `{output_field}`
    #[default]
    Text,

    /// `context[output_field] = { <output_field>: text, text, model, temperature }`,
    /// consumed as `{output_field.<subfield>}`
    Record,
}

/// One function's entry in a [`PipelineReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    pub function_id: String,
    pub function_name: String,
    pub result: ExecutionResult,
}

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Steps that ran (or were skipped), in execution order
    pub steps: Vec<PipelineStep>,

    /// Context after the last step, including bound outputs
    pub context: VariableContext,

    /// Name of the function that stopped the run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,
}

impl PipelineReport {
    /// True when every step either succeeded or was skipped
    pub fn is_complete(&self) -> bool {
        self.halted_at.is_none()
    }

    pub fn step(&self, function_name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.function_name == function_name)
    }
}

/// Runs functions sequentially, feeding outputs forward
pub struct PipelineRunner {
    executor: FunctionExecutor,
    binding: OutputBinding,
}

impl PipelineRunner {
    pub fn new(executor: FunctionExecutor) -> Self {
        Self {
            executor,
            binding: OutputBinding::default(),
        }
    }

    /// Choose how outputs are written into the context
    pub fn with_binding(mut self, binding: OutputBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Run every function of `doc` in order
    pub async fn run_document(&self, doc: &ConfigDocument, context: VariableContext) -> PipelineReport {
        self.run(doc.ordered_functions(), context).await
    }

    /// Run `functions` sorted by `order`; ties keep the given order
    ///
    /// Skipped functions are recorded and the run continues. The first
    /// rejected or failed function halts the run.
    pub async fn run<'a, I>(&self, functions: I, context: VariableContext) -> PipelineReport
    where
        I: IntoIterator<Item = &'a FunctionDef>,
    {
        let options = self.executor.dispatcher().call_options();
        self.run_with(functions, context, &options).await
    }

    /// [`run`](Self::run) with caller-supplied call options
    ///
    /// Every step gets its own request ID; the timeout and cancellation token
    /// are shared, so cancelling the token stops the whole run.
    pub async fn run_with<'a, I>(
        &self,
        functions: I,
        mut context: VariableContext,
        options: &CallOptions,
    ) -> PipelineReport
    where
        I: IntoIterator<Item = &'a FunctionDef>,
    {
        let mut functions: Vec<&FunctionDef> = functions.into_iter().collect();
        functions.sort_by_key(|f| f.order);

        let mut steps = Vec::with_capacity(functions.len());
        let mut halted_at = None;

        for function in functions {
            let step_options = options.renewed();
            let result = self.executor.run_with(function, &context, &step_options).await;

            let halted = match &result {
                ExecutionResult::Skipped { .. } => false,
                ExecutionResult::Completed(CompletionResult::Success(success)) => {
                    let value = bind_output(self.binding, function, success.text.clone(), &success.model);
                    context.insert(function.output_field.clone(), value);
                    debug!(
                        function = %function.name,
                        output_field = %function.output_field,
                        "bound function output"
                    );
                    false
                }
                ExecutionResult::Rejected(_) | ExecutionResult::Completed(_) => true,
            };

            steps.push(PipelineStep {
                function_id: function.id.clone(),
                function_name: function.name.clone(),
                result,
            });

            if halted {
                warn!(function = %function.name, "pipeline halted");
                halted_at = Some(function.name.clone());
                break;
            }
        }

        info!(
            steps = steps.len(),
            halted = halted_at.is_some(),
            "pipeline finished"
        );

        PipelineReport {
            steps,
            context,
            halted_at,
        }
    }
}

fn bind_output(binding: OutputBinding, function: &FunctionDef, text: String, model: &str) -> VariableValue {
    match binding {
        OutputBinding::Text => VariableValue::Text(text),
        OutputBinding::Record => {
            let mut record = BTreeMap::new();
            record.insert("text".to_string(), VariableValue::Text(text.clone()));
            record.insert("model".to_string(), VariableValue::from(model));
            record.insert(
                "temperature".to_string(),
                temperature_value(function.prompt_template.temperature),
            );
            // the named field always carries the text, even over a fixed key
            record.insert(function.output_field.clone(), VariableValue::Text(text));
            VariableValue::Map(record)
        }
    }
}

/// Widen through the shortest decimal form so 0.7 stays 0.7
fn temperature_value(temperature: f32) -> VariableValue {
    temperature
        .to_string()
        .parse::<f64>()
        .map(VariableValue::from)
        .unwrap_or(VariableValue::Null)
}
