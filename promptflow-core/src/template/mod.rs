//! Variable resolution for prompt templates
//!
//! Tokens take the form `{name}` or `{name.subfield}`. Resolution is a
//! lenient two-pass literal replacement:
//! 1. every top-level scalar `k` replaces `{k}`
//! 2. every nested map `k` replaces `{k.k2}` for each of its keys
//!
//! The first pass runs over the whole template before the second starts.
//! Tokens without a matching value are left verbatim so a partially filled
//! context still produces reviewable output.

use crate::protocol::types::{VariableContext, VariableValue};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `{name}` or `{name.subfield}` with identifier characters only
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)?)\}").expect("token pattern is valid")
});

/// Resolve every known token in `template` against `context`
pub fn resolve(template: &str, context: &VariableContext) -> String {
    if !template.contains('{') || context.is_empty() {
        return template.to_string();
    }

    let mut resolved = template.to_string();

    for (key, value) in context.iter() {
        if !value.is_scalar() {
            continue;
        }
        if let Some(text) = value.as_text() {
            resolved = resolved.replace(&token(key), &text);
        }
    }

    for (key, value) in context.iter() {
        let VariableValue::Map(fields) = value else {
            continue;
        };
        for (field, nested) in fields {
            if let Some(text) = nested.as_text() {
                resolved = resolved.replace(&token(&format!("{key}.{field}")), &text);
            }
        }
    }

    resolved
}

/// Distinct tokens in order of first appearance, braces included
pub fn extract_tokens(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN_PATTERN
        .find_iter(template)
        .map(|m| m.as_str().to_string())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Tokens that would survive resolution against `context`
pub fn unresolved_tokens(template: &str, context: &VariableContext) -> Vec<String> {
    extract_tokens(&resolve(template, context))
}

/// Variable path named by a token, e.g. `{a.b}` -> `a.b`
pub fn token_path(token: &str) -> Option<&str> {
    token.strip_prefix('{')?.strip_suffix('}')
}

fn token(path: &str) -> String {
    format!("{{{path}}}")
}
