//! Trust policy resolution
//!
//! Each trust input is resolved independently with the precedence
//! explicit provider option > environment variable > platform default.
//! For a provider prefix such as `anthropic` the inputs are:
//!
//! | input        | provider option            | environment variable             |
//! |--------------|----------------------------|----------------------------------|
//! | CA file      | `anthropic_root_ca_file`   | `ANTHROPIC_ROOT_CA_FILE`         |
//! | CA PEM       | `anthropic_root_ca_pem`    | `ANTHROPIC_ROOT_CA_PEM`          |
//! | SPKI pin     | `anthropic_spki_hash`      | `ANTHROPIC_EXPECTED_SPKI_HASH`   |

use super::error::TransportError;
use crate::options::ProviderOptions;
use serde_json::Value;
use std::path::PathBuf;

/// Environment lookup used during resolution
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads the real process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Which TLS peers a client accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustPolicy {
    /// Inline PEM bundle added to the trust roots
    pub root_ca_pem: Option<String>,

    /// PEM file added to the trust roots
    pub root_ca_file: Option<PathBuf>,

    /// Expected base64 SHA-256 of the leaf SubjectPublicKeyInfo
    ///
    /// A `sha256/` prefix is accepted.
    pub spki_pin: Option<String>,
}

impl TrustPolicy {
    /// Platform defaults only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_ca_pem(mut self, pem: impl Into<String>) -> Self {
        self.root_ca_pem = Some(pem.into());
        self
    }

    pub fn with_root_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_ca_file = Some(path.into());
        self
    }

    pub fn with_spki_pin(mut self, pin: impl Into<String>) -> Self {
        self.spki_pin = Some(pin.into());
        self
    }

    /// Whether a custom CA bundle was supplied
    pub fn has_custom_roots(&self) -> bool {
        self.root_ca_pem.is_some() || self.root_ca_file.is_some()
    }

    /// Whether any hardening beyond the platform defaults was requested
    pub fn is_hardened(&self) -> bool {
        self.has_custom_roots() || self.spki_pin.is_some()
    }

    /// Resolve the policy for `prefix` from provider options and `env`
    pub fn resolve(
        prefix: &str,
        options: Option<&ProviderOptions>,
        env: EnvLookup<'_>,
    ) -> Result<Self, TransportError> {
        let upper = prefix.to_uppercase();

        let root_ca_file = value_from_option_or_env(
            options,
            &format!("{prefix}_root_ca_file"),
            &format!("{upper}_ROOT_CA_FILE"),
            env,
        )?;
        let root_ca_pem = value_from_option_or_env(
            options,
            &format!("{prefix}_root_ca_pem"),
            &format!("{upper}_ROOT_CA_PEM"),
            env,
        )?;
        let spki_pin = value_from_option_or_env(
            options,
            &format!("{prefix}_spki_hash"),
            &format!("{upper}_EXPECTED_SPKI_HASH"),
            env,
        )?;

        Ok(Self {
            root_ca_pem,
            root_ca_file: root_ca_file.map(PathBuf::from),
            spki_pin,
        })
    }

    /// Resolve against the process environment
    pub fn from_env(prefix: &str, options: Option<&ProviderOptions>) -> Result<Self, TransportError> {
        Self::resolve(prefix, options, &process_env)
    }
}

/// Trimmed value from the provider options, else from the environment
///
/// An empty or null option falls through to the environment; any other
/// non-string option is rejected.
pub(crate) fn value_from_option_or_env(
    options: Option<&ProviderOptions>,
    key: &str,
    env_key: &str,
    env: EnvLookup<'_>,
) -> Result<Option<String>, TransportError> {
    if let Some(raw) = options.and_then(|map| map.get(key)) {
        match raw {
            Value::String(value) => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Ok(Some(trimmed.to_string()));
                }
            }
            Value::Null => {}
            _ => {
                return Err(TransportError::InvalidOption {
                    key: key.to_string(),
                    expected: "a string",
                })
            }
        }
    }

    Ok(env(env_key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
