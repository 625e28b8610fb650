//! Cloud credential resolution
//!
//! Service-account credentials are resolved in this order, first hit wins:
//!
//! 1. `credentials_json` provider option (string, or an inline JSON object)
//! 2. `credentials_file` provider option
//! 3. `VERTEXAI_CREDENTIALS_JSON`
//! 4. `VERTEXAI_CREDENTIALS_FILE`
//! 5. `GOOGLE_APPLICATION_CREDENTIALS`
//!
//! A file source must exist at resolution time.

use super::error::TransportError;
use super::policy::{process_env, EnvLookup};
use crate::config::SecretString;
use crate::options::ProviderOptions;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CREDENTIALS_JSON_OPTION: &str = "credentials_json";
pub const CREDENTIALS_FILE_OPTION: &str = "credentials_file";
pub const CREDENTIALS_JSON_ENV: &str = "VERTEXAI_CREDENTIALS_JSON";
pub const CREDENTIALS_FILE_ENV: &str = "VERTEXAI_CREDENTIALS_FILE";
pub const APPLICATION_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Where service-account credentials come from
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Inline credentials document
    Json(SecretString),
    /// Path to a credentials document
    File(PathBuf),
    /// Nothing configured
    None,
}

impl CredentialSource {
    /// Resolve the credential source from provider options and `env`
    pub fn resolve(options: Option<&ProviderOptions>, env: EnvLookup<'_>) -> Result<Self, TransportError> {
        if let Some(json) = inline_json_option(options)? {
            debug!("Using inline credentials from provider options");
            return Ok(CredentialSource::Json(json.into()));
        }
        if let Some(path) = string_option(options, CREDENTIALS_FILE_OPTION)? {
            return Self::file(path);
        }
        if let Some(json) = non_empty(env(CREDENTIALS_JSON_ENV)) {
            debug!(env = CREDENTIALS_JSON_ENV, "Using inline credentials from environment");
            return Ok(CredentialSource::Json(json.into()));
        }
        if let Some(path) = non_empty(env(CREDENTIALS_FILE_ENV)) {
            return Self::file(path);
        }
        if let Some(path) = non_empty(env(APPLICATION_CREDENTIALS_ENV)) {
            return Self::file(path);
        }
        Ok(CredentialSource::None)
    }

    /// Resolve against the process environment
    pub fn from_env(options: Option<&ProviderOptions>) -> Result<Self, TransportError> {
        Self::resolve(options, &process_env)
    }

    fn file(path: String) -> Result<Self, TransportError> {
        let path = PathBuf::from(path);
        check_accessible(&path)?;
        debug!(path = %path.display(), "Using credentials file");
        Ok(CredentialSource::File(path))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CredentialSource::None)
    }

    /// Credentials document, reading the file when needed
    pub fn load(&self) -> Result<Option<SecretString>, TransportError> {
        match self {
            CredentialSource::Json(json) => Ok(Some(json.clone())),
            CredentialSource::File(path) => std::fs::read_to_string(path)
                .map(|contents| Some(SecretString::new(contents)))
                .map_err(|source| TransportError::CredentialsFile {
                    path: path.clone(),
                    source,
                }),
            CredentialSource::None => Ok(None),
        }
    }
}

fn check_accessible(path: &Path) -> Result<(), TransportError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| TransportError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })
}

fn inline_json_option(options: Option<&ProviderOptions>) -> Result<Option<String>, TransportError> {
    match options.and_then(|map| map.get(CREDENTIALS_JSON_OPTION)) {
        Some(value @ Value::Object(_)) => Ok(Some(value.to_string())),
        _ => string_option(options, CREDENTIALS_JSON_OPTION),
    }
}

fn string_option(options: Option<&ProviderOptions>, key: &str) -> Result<Option<String>, TransportError> {
    match options.and_then(|map| map.get(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(non_empty(Some(value.clone()))),
        Some(_) => Err(TransportError::InvalidOption {
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
