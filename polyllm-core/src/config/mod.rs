//! Provider profile configuration
//!
//! Profiles are loaded from YAML or JSON files. `${VAR}` references are
//! interpolated from the environment before parsing, the result is validated,
//! and each profile can then be turned into the base [`LlmOptions`] of an
//! adapter:
//!
//! ```yaml
//! version: "0.1"
//! defaults:
//!   max_tokens: 1024
//! profiles:
//!   - name: default
//!     provider: openai
//!     api_key: ${OPENAI_API_KEY}
//!     model: gpt-4o
//! ```
//!
//! [`LlmOptions`]: crate::options::LlmOptions

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{interpolate_env_vars, interpolate_env_vars_with, referenced_env_vars};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{PolyllmConfig, Profile, ProfileDefaults, SUPPORTED_VERSION};
pub use secrets::{is_sensitive_field, redact_by_field_name, SafeLogging, SecretString};
pub use validator::ConfigValidator;

use crate::transport::EnvLookup;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<PolyllmConfig> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_yaml(&interpolate_env_vars(&content)?, path)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<PolyllmConfig> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_json(&interpolate_env_vars(&content)?, path)
}

/// Load a configuration, picking the format from the file extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<PolyllmConfig> {
    load_from_path_with(path, &crate::transport::process_env)
}

/// [`load_from_path`] with an explicit environment lookup
pub fn load_from_path_with<P: AsRef<Path>>(path: P, env: EnvLookup<'_>) -> ConfigResult<PolyllmConfig> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let parse: fn(&str, &Path) -> ConfigResult<PolyllmConfig> = match extension.as_deref() {
        Some("yaml") | Some("yml") => parse_yaml,
        Some("json") => parse_json,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let content = read(path)?;
    parse(&interpolate_env_vars_with(&content, env)?, path)
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_yaml(content: &str, path: &Path) -> ConfigResult<PolyllmConfig> {
    let config: PolyllmConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;
    finish(config, path)
}

fn parse_json(content: &str, path: &Path) -> ConfigResult<PolyllmConfig> {
    let config: PolyllmConfig =
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;
    finish(config, path)
}

fn finish(config: PolyllmConfig, path: &Path) -> ConfigResult<PolyllmConfig> {
    ConfigValidator::new().validate(&config)?;
    for profile in &config.profiles {
        debug!(path = %path.display(), "Loaded {}", profile.safe_for_logging());
    }
    Ok(config)
}
