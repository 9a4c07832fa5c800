//! Configuration validation utilities

use super::error::ValidationError;
use super::schema::ConfigDocument;
use crate::protocol::types::FunctionDef;
use crate::registry::ModelRegistry;
use crate::template;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Validates configuration documents
///
/// Structural problems (duplicates, bad names, out-of-range temperatures) are
/// errors. References the document can still run with, such as a model id the
/// registry does not know or a declared variable token the prompts never use,
/// are reported as warnings.
pub struct ConfigValidator {
    registry: Arc<ModelRegistry>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    /// Create a validator that checks model ids against the default registry
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ModelRegistry::default()))
    }

    pub fn with_registry(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Validate a document, logging any warnings
    pub fn validate(&self, doc: &ConfigDocument) -> Result<(), ValidationError> {
        if doc.version.trim().is_empty() {
            return Err(ValidationError::required("version"));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for (i, function) in doc.functions.iter().enumerate() {
            let path = format!("functions[{}]", i);
            validate_function(function, &path)?;

            if !ids.insert(function.id.as_str()) {
                return Err(ValidationError::duplicate(format!("{}.id", path), &function.id));
            }
            if !names.insert(function.name.as_str()) {
                return Err(ValidationError::duplicate(format!("{}.name", path), &function.name)
                    .with_context("function names must be unique"));
            }
        }

        for warning in self.warnings(doc) {
            warn!("{}", warning);
        }

        Ok(())
    }

    /// Non-fatal findings for a document
    pub fn warnings(&self, doc: &ConfigDocument) -> Vec<String> {
        let mut warnings = Vec::new();

        for (i, model) in doc.default_models.iter().enumerate() {
            if !self.registry.contains(model) {
                warnings.push(format!(
                    "defaultModels[{}]: unknown model '{}', calls will use the fallback provider",
                    i, model
                ));
            }
        }

        for (i, function) in doc.functions.iter().enumerate() {
            let tmpl = &function.prompt_template;
            if !self.registry.contains(&tmpl.model) {
                warnings.push(format!(
                    "functions[{}].promptTemplate.model: unknown model '{}', calls will use the fallback provider",
                    i, tmpl.model
                ));
            }

            let tokens: Vec<String> = template::extract_tokens(&tmpl.system_prompt)
                .into_iter()
                .chain(template::extract_tokens(&tmpl.user_prompt))
                .collect();
            let used: HashSet<&str> = tokens
                .iter()
                .filter_map(|t| template::token_path(t))
                .collect();
            for token in &tmpl.variable_tokens {
                if !used.contains(declared_path(token)) {
                    warnings.push(format!(
                        "functions[{}].promptTemplate.variableTokens: '{}' does not appear in either prompt",
                        i, token
                    ));
                }
            }
        }

        warnings
    }
}

fn validate_function(function: &FunctionDef, path: &str) -> Result<(), ValidationError> {
    if function.id.trim().is_empty() {
        return Err(ValidationError::required(format!("{}.id", path)));
    }

    if function.name.is_empty() {
        return Err(ValidationError::required(format!("{}.name", path)));
    }
    if function.name.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format(
            format!("{}.name", path),
            format!("'{}' must not contain whitespace", function.name),
        ));
    }

    if function.output_field.trim().is_empty() {
        return Err(ValidationError::required(format!("{}.outputField", path)));
    }

    for (j, input) in function.required_inputs.iter().enumerate() {
        if input.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.requiredInputs[{}]", path, j)));
        }
    }

    let temperature = function.prompt_template.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ValidationError::out_of_range(
            format!("{}.promptTemplate.temperature", path),
            format!("temperature must be between 0.0 and 2.0, got {}", temperature),
        ));
    }

    if function.prompt_template.model.trim().is_empty() {
        return Err(ValidationError::required(format!("{}.promptTemplate.model", path)));
    }

    Ok(())
}

/// Declared tokens may be written with or without braces
fn declared_path(token: &str) -> &str {
    let trimmed = token.trim();
    template::token_path(trimmed).unwrap_or(trimmed)
}
