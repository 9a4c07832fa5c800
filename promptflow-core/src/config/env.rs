//! Environment variable interpolation and environment-sourced settings

use super::error::{ConfigError, ConfigResult};
use super::settings::{ConnectionConfig, ProviderEndpoint, ProviderSettings};
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// OpenAI API key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Anthropic API key
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// Optional OpenAI base URL override
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
/// Optional Anthropic base URL override
pub const ANTHROPIC_BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
/// Optional per-request timeout in milliseconds
pub const TIMEOUT_MS_VAR: &str = "PROMPTFLOW_TIMEOUT_MS";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
});

/// Interpolate `${VAR}` references in a configuration string from the process environment
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_with(content, |name| env::var(name).ok())
}

/// Interpolate `${VAR}` references using `lookup`
///
/// Fails on the first variable `lookup` cannot supply.
pub fn interpolate_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = None;
    let result = ENV_VAR_PATTERN.replace_all(content, |caps: &regex::Captures<'_>| {
        match lookup(&caps[1]) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(result.into_owned()),
    }
}

/// Build provider settings from `lookup`
///
/// A provider is configured only when its API key is present and non-blank.
pub(crate) fn settings_from_lookup<F>(lookup: F) -> ConfigResult<ProviderSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let endpoint = |key_var: &str, url_var: &str| {
        non_blank(key_var).map(|key| ProviderEndpoint {
            api_key: key.into(),
            base_url: non_blank(url_var),
        })
    };

    let mut connection = ConnectionConfig::default();
    if let Some(raw) = non_blank(TIMEOUT_MS_VAR) {
        connection.request_timeout_ms =
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("{} must be a positive integer, got '{}'", TIMEOUT_MS_VAR, raw),
            })?;
    }

    let settings = ProviderSettings {
        openai: endpoint(OPENAI_API_KEY_VAR, OPENAI_BASE_URL_VAR),
        anthropic: endpoint(ANTHROPIC_API_KEY_VAR, ANTHROPIC_BASE_URL_VAR),
        connection,
    };
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_interpolate_env_vars() {
        let lookup = vars(&[("TEST_VAR", "test_value")]);
        let result = interpolate_with("api_key: ${TEST_VAR}", lookup).unwrap();
        assert_eq!(result, "api_key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let result = interpolate_with("api_key: ${MISSING_VAR}", vars(&[]));

        if let Err(ConfigError::EnvVarNotFound { var }) = result {
            assert_eq!(var, "MISSING_VAR");
        } else {
            panic!("Expected EnvVarNotFound error");
        }
    }

    #[test]
    fn test_multiple_env_vars() {
        let lookup = vars(&[("VAR1", "value1"), ("VAR2", "value2")]);
        let result = interpolate_with("key1: ${VAR1}, key2: ${VAR2}, again: ${VAR1}", lookup).unwrap();
        assert_eq!(result, "key1: value1, key2: value2, again: value1");
    }

    #[test]
    fn test_lowercase_references_are_left_alone() {
        let result = interpolate_with("${not_a_var} {grade}", vars(&[])).unwrap();
        assert_eq!(result, "${not_a_var} {grade}");
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = settings_from_lookup(vars(&[
            (OPENAI_API_KEY_VAR, "sk-openai"),
            (OPENAI_BASE_URL_VAR, "http://localhost:8080/v1"),
            (ANTHROPIC_BASE_URL_VAR, "http://ignored"),
            (TIMEOUT_MS_VAR, "1500"),
        ]))
        .unwrap();

        let openai = settings.openai.unwrap();
        assert_eq!(openai.api_key.expose_secret(), "sk-openai");
        assert_eq!(openai.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(settings.anthropic.is_none());
        assert_eq!(settings.connection.request_timeout_ms, 1500);
    }

    #[test]
    fn test_blank_key_means_unconfigured() {
        let settings = settings_from_lookup(vars(&[(ANTHROPIC_API_KEY_VAR, "  ")])).unwrap();
        assert!(settings.anthropic.is_none());
        assert!(!settings.has_providers());
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let result = settings_from_lookup(vars(&[(TIMEOUT_MS_VAR, "soon")]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
