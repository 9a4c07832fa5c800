//! Core data types shared by the resolver, adapters, dispatcher and executor
//!
//! This module contains the plain data structures that flow between the
//! configuration layer and the execution engine. The design prioritizes:
//! - Values passed by reference and never mutated by the engine
//! - Errors returned as data so callers can always branch on a result
//! - Wire compatibility with the camelCase configuration document

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Logical model identifier (e.g. `MODEL_GPT_4O`)
pub type ModelId = String;

/// Provider identifier (e.g. `openai`)
pub type ProviderId = String;

/// A value stored in a [`VariableContext`]
///
/// Scalars are substituted directly. Nested maps are addressed with dotted
/// tokens such as `{unit_plan.outcomes}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Explicit null; never substituted
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(serde_json::Number),
    /// Text scalar
    Text(String),
    /// List value, substituted as compact JSON
    List(Vec<VariableValue>),
    /// Nested mapping
    Map(BTreeMap<String, VariableValue>),
}

impl VariableValue {
    /// Whether the value takes part in the simple `{key}` substitution pass
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Map(_) | Self::Null)
    }

    /// Canonical string form, or `None` for null
    ///
    /// Maps and lists degrade to their compact JSON form so arbitrarily deep
    /// contexts still produce something reviewable.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(number_text(n)),
            Self::Text(s) => Some(s.clone()),
            Self::List(_) | Self::Map(_) => serde_json::to_string(self).ok(),
        }
    }

    /// Borrow the nested map, if this value is one
    pub fn as_map(&self) -> Option<&BTreeMap<String, VariableValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Integral floats print without a fractional part, so `5.0` reads `5`
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(Self::Number)
            .unwrap_or(Self::Null)
    }
}

impl From<BTreeMap<String, VariableValue>> for VariableValue {
    fn from(value: BTreeMap<String, VariableValue>) -> Self {
        Self::Map(value)
    }
}

impl From<Value> for VariableValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Named variables available to a template during one execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext {
    values: BTreeMap<String, VariableValue>,
}

impl VariableContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a top-level variable
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<VariableValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a top-level variable
    pub fn get(&self, key: &str) -> Option<&VariableValue> {
        self.values.get(key)
    }

    /// Look up a dotted path such as `unit_plan.outcomes`
    pub fn lookup(&self, path: &str) -> Option<&VariableValue> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether a dotted path is present in the context
    pub fn is_defined(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Iterate over top-level variables
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a context from a JSON object; any other JSON value yields an empty context
    pub fn from_json(value: Value) -> Self {
        match VariableValue::from(value) {
            VariableValue::Map(values) => Self { values },
            _ => Self::default(),
        }
    }
}

impl<K: Into<String>, V: Into<VariableValue>> FromIterator<(K, V)> for VariableContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A prompt template bound to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,

    pub name: String,

    /// System instructions, may contain variable tokens
    #[serde(default)]
    pub system_prompt: String,

    /// User message, may contain variable tokens
    #[serde(default)]
    pub user_prompt: String,

    /// Logical model identifier
    pub model: ModelId,

    /// Sampling temperature (0.0 to 2.0)
    pub temperature: f32,

    /// Tokens the template is expected to use (documentation only)
    #[serde(default)]
    pub variable_tokens: Vec<String>,
}

/// A named, ordered unit pairing a prompt template with its inputs and output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDef {
    pub id: String,

    /// Unique machine name, no whitespace
    pub name: String,

    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Execution and display position; ties keep insertion order
    pub order: i64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Variable names (dotted paths allowed) that must be present before running
    #[serde(default)]
    pub required_inputs: Vec<String>,

    /// Context key the caller stores this function's result under
    pub output_field: String,

    pub prompt_template: PromptTemplate,
}

fn default_enabled() -> bool {
    true
}

/// Static description of a model known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: ModelId,
    pub display_name: String,
    pub provider_id: ProviderId,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// Token accounting reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Usage whose total is the sum of prompt and completion tokens
    pub fn summed(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Classification of a failed completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required input was missing; detected before any network call
    Validation,
    /// Unknown provider or missing adapter
    Configuration,
    /// Network failure before a response arrived
    Transport,
    /// The call timed out or was cancelled by the caller
    Timeout,
    /// The provider answered with a non-2xx status or an unreadable body
    Provider,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Configuration => "configuration_error",
            Self::Transport => "transport_error",
            Self::Timeout => "timeout",
            Self::Provider => "provider_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSuccess {
    /// Generated text
    pub text: String,

    /// Token usage as reported by the provider
    pub usage: TokenUsage,

    /// Provider model that produced the text
    pub model: ModelId,
}

/// Failed completion, returned as data rather than raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{error_kind}: {message}")]
pub struct CompletionFailure {
    pub error_kind: ErrorKind,

    /// Most specific message available, provider text preserved verbatim
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// Raw provider error payload, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_details: Option<Value>,
}

impl CompletionFailure {
    pub fn new(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error_kind,
            message: message.into(),
            http_status: None,
            provider_details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn provider(status: u16, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            error_kind: ErrorKind::Provider,
            message: message.into(),
            http_status: Some(status),
            provider_details: details,
        }
    }

    /// Whether a caller-level retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self.error_kind {
            ErrorKind::Transport | ErrorKind::Timeout => true,
            ErrorKind::Provider => matches!(self.http_status, Some(429) | Some(500..=599)),
            ErrorKind::Validation | ErrorKind::Configuration => false,
        }
    }
}

/// Outcome of one completion call: exactly one of success or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionResult {
    Success(CompletionSuccess),
    Failure(CompletionFailure),
}

impl CompletionResult {
    pub fn success(text: impl Into<String>, usage: TokenUsage, model: impl Into<String>) -> Self {
        Self::Success(CompletionSuccess {
            text: text.into(),
            usage,
            model: model.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(success) => Some(&success.text),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CompletionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.error_kind)
    }

    /// True for failures a caller-level retry could plausibly fix
    pub fn is_retryable(&self) -> bool {
        self.failure().is_some_and(CompletionFailure::is_retryable)
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<CompletionSuccess, CompletionFailure> {
        match self {
            Self::Success(success) => Ok(success),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<CompletionFailure> for CompletionResult {
    fn from(failure: CompletionFailure) -> Self {
        Self::Failure(failure)
    }
}

/// Unresolved prompt data handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptData {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: ModelId,
    pub temperature: f32,
    #[serde(default)]
    pub variables: VariableContext,
}

impl PromptData {
    /// Prompt data for a template evaluated against `variables`
    pub fn from_template(template: &PromptTemplate, variables: VariableContext) -> Self {
        Self {
            system_prompt: template.system_prompt.clone(),
            user_prompt: template.user_prompt.clone(),
            model: template.model.clone(),
            temperature: template.temperature,
            variables,
        }
    }
}

/// Result of probing a provider for reachability and valid credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Text returned by the connection test, if it succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ConnectionStatus {
    pub fn connected(response: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "API connection successful".to_string(),
            error_detail: None,
            response: Some(response.into()),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            message: "API connection failed".to_string(),
            error_detail: Some(detail.into()),
            response: None,
        }
    }
}
