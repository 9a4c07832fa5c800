//! Configuration module for Promptflow
//!
//! Two kinds of configuration live here:
//!
//! - [`ConfigDocument`]: the camelCase function document (functions, default
//!   models, version) with load/save/import/export helpers.
//! - [`ProviderSettings`]: provider credentials and connection tuning, read from
//!   the environment or from a settings file with `${VAR}` interpolation.

mod env;
mod error;
mod schema;
mod secrets;
mod settings;
mod validator;

pub use env::{
    interpolate_env_vars, ANTHROPIC_API_KEY_VAR, ANTHROPIC_BASE_URL_VAR, OPENAI_API_KEY_VAR,
    OPENAI_BASE_URL_VAR, TIMEOUT_MS_VAR,
};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{ConfigDocument, DOCUMENT_VERSION};
pub use secrets::SecretString;
pub use settings::{ConnectionConfig, ProviderEndpoint, ProviderSettings};
pub use validator::ConfigValidator;

use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Path label used in errors for documents that did not come from a file
const INLINE_SOURCE: &str = "<inline>";

fn read_file(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn json_parse_error(path: &str, e: serde_json::Error) -> ConfigError {
    // serde_json reports line 0 for errors that have no source position
    let located = e.line() > 0;
    ConfigError::ParseError {
        path: path.to_string(),
        line: located.then(|| e.line()),
        column: located.then(|| e.column()),
        message: e.to_string(),
    }
}

fn yaml_parse_error(path: &str, e: serde_yaml::Error) -> ConfigError {
    ConfigError::ParseError {
        path: path.to_string(),
        line: e.location().map(|l| l.line()),
        column: e.location().map(|l| l.column()),
        message: e.to_string(),
    }
}

/// Load a function document from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ConfigDocument> {
    let path = path.as_ref();
    let content = read_file(path)?;

    let doc: ConfigDocument = serde_json::from_str(&content)
        .map_err(|e| json_parse_error(&path.to_string_lossy(), e))?;

    ConfigValidator::new().validate(&doc)?;
    debug!(path = %path.display(), functions = doc.functions.len(), "loaded configuration");
    Ok(doc)
}

/// Load a JSON function document, or the default document if none is stored yet
///
/// Only a missing file falls back; an unreadable or invalid file is still an error.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> ConfigResult<ConfigDocument> {
    let path = path.as_ref();
    match load_from_json(path) {
        Err(ConfigError::IoError { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no stored configuration, using defaults");
            Ok(ConfigDocument::default_document())
        }
        result => result,
    }
}

/// Load a function document from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ConfigDocument> {
    let path = path.as_ref();
    let content = read_file(path)?;

    let doc: ConfigDocument = serde_yaml::from_str(&content)
        .map_err(|e| yaml_parse_error(&path.to_string_lossy(), e))?;

    ConfigValidator::new().validate(&doc)?;
    debug!(path = %path.display(), functions = doc.functions.len(), "loaded configuration");
    Ok(doc)
}

/// Validate and write a function document as pretty JSON
pub fn save_to_json<P: AsRef<Path>>(path: P, doc: &ConfigDocument) -> ConfigResult<()> {
    let path = path.as_ref();
    let content = export_json(doc)?;

    fs::write(path, content).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    info!(path = %path.display(), functions = doc.functions.len(), "saved configuration");
    Ok(())
}

/// Parse and validate a function document from a JSON string
///
/// The document must contain a `functions` array.
pub fn import_json(content: &str) -> ConfigResult<ConfigDocument> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| json_parse_error(INLINE_SOURCE, e))?;

    if !value.get("functions").is_some_and(Value::is_array) {
        return Err(ConfigError::Invalid {
            message: "Invalid configuration format: expected a 'functions' array".to_string(),
        });
    }

    let doc: ConfigDocument =
        serde_json::from_value(value).map_err(|e| json_parse_error(INLINE_SOURCE, e))?;

    ConfigValidator::new().validate(&doc)?;
    info!(functions = doc.functions.len(), "imported configuration");
    Ok(doc)
}

/// Validate a function document and render it as pretty JSON
pub fn export_json(doc: &ConfigDocument) -> ConfigResult<String> {
    ConfigValidator::new().validate(doc)?;
    serde_json::to_string_pretty(doc).map_err(|e| ConfigError::SerializeError {
        message: e.to_string(),
    })
}

/// Load provider settings from a YAML file, interpolating `${VAR}` references
pub fn load_settings_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ProviderSettings> {
    let path = path.as_ref();
    let content = read_file(path)?;

    // Interpolate environment variables before parsing
    let interpolated = interpolate_env_vars(&content)?;

    let settings: ProviderSettings = serde_yaml::from_str(&interpolated)
        .map_err(|e| yaml_parse_error(&path.to_string_lossy(), e))?;

    settings.validate()?;
    Ok(settings)
}

/// Load provider settings from a JSON file, interpolating `${VAR}` references
pub fn load_settings_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ProviderSettings> {
    let path = path.as_ref();
    let content = read_file(path)?;

    // Interpolate environment variables before parsing
    let interpolated = interpolate_env_vars(&content)?;

    let settings: ProviderSettings = serde_json::from_str(&interpolated)
        .map_err(|e| json_parse_error(&path.to_string_lossy(), e))?;

    settings.validate()?;
    Ok(settings)
}
