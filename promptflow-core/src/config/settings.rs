//! Provider connection settings
//!
//! Settings are separate from function documents: they carry credentials and
//! transport tuning, and may come from the environment or from a settings file
//! with `${VAR}` interpolation.

use super::error::{ConfigResult, ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};

/// Credentials and endpoint for one provider
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEndpoint {
    /// API key (may be an env var placeholder before interpolation)
    pub api_key: SecretString,

    /// Base URL override; the provider's public endpoint when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
        }
    }
}

fn default_connect_timeout() -> u64 { 10_000 }
fn default_request_timeout() -> u64 { 60_000 }
fn default_max_idle() -> usize { 10 }

/// Settings for every provider the dispatcher may talk to
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderEndpoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderEndpoint>,

    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl ProviderSettings {
    /// Read settings from `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
    /// `OPENAI_BASE_URL`, `ANTHROPIC_BASE_URL` and `PROMPTFLOW_TIMEOUT_MS`
    pub fn from_env() -> ConfigResult<Self> {
        super::env::settings_from_lookup(|name| std::env::var(name).ok())
    }

    /// True when at least one provider has credentials
    pub fn has_providers(&self) -> bool {
        self.openai.is_some() || self.anthropic.is_some()
    }

    /// Validate keys, base URLs and timeouts
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, endpoint) in [("openai", &self.openai), ("anthropic", &self.anthropic)] {
            if let Some(endpoint) = endpoint {
                endpoint.validate(name)?;
            }
        }

        if self.connection.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.connect_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.connection.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.request_timeout_ms",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl ProviderEndpoint {
    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::required(format!("{}.api_key", path)));
        }

        let Some(base_url) = &self.base_url else {
            return Ok(());
        };

        match url::Url::parse(base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            Ok(url) => Err(ValidationError::new(
                format!("{}.base_url", path),
                ValidationErrorKind::InvalidUrl {
                    message: format!("URL scheme must be http or https, got: {}", url.scheme()),
                },
            )),
            Err(e) => Err(ValidationError::new(
                format!("{}.base_url", path),
                ValidationErrorKind::InvalidUrl {
                    message: e.to_string(),
                },
            )),
        }
    }
}
