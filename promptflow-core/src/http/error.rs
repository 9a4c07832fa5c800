//! HTTP error mapping utilities

use crate::protocol::types::CompletionFailure;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Map a non-2xx status and its body to a provider failure
///
/// The provider's own message is preserved verbatim; the raw body (parsed as
/// JSON when possible) is kept as `provider_details`.
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> CompletionFailure {
    let parsed = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok());

    let message = parsed
        .as_ref()
        .and_then(extract_error_message)
        .or_else(|| body.clone().filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    tracing::debug!(
        status = status.as_u16(),
        %request_id,
        "mapped provider error: {}",
        message
    );

    let details = parsed.or_else(|| body.map(Value::String));
    CompletionFailure::provider(status.as_u16(), message, details)
}

/// Map a transport-level reqwest error to a failure
pub fn map_transport_error(err: &reqwest::Error, request_id: Uuid) -> CompletionFailure {
    if err.is_timeout() {
        tracing::warn!(%request_id, "request timed out");
        CompletionFailure::timeout("Request timed out")
    } else if err.is_connect() {
        tracing::error!(%request_id, "connection error: {}", err);
        CompletionFailure::transport(format!("Connection failed: {}", err))
    } else {
        tracing::error!(%request_id, "request error: {}", err);
        CompletionFailure::transport(err.to_string())
    }
}

/// Extract the most specific message from a provider error body
pub fn extract_error_message(json: &Value) -> Option<String> {
    // OpenAI and Anthropic: { "error": { "message": "...", "type": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    // Generic: { "message": "..." }
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }

    // Generic: { "error": "..." }
    json.get("error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
