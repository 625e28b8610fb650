//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::PolyllmConfig;
use crate::providers::custom::ENDPOINT_OPTIONS;
use crate::providers::ProviderId;
use serde_json::Value;

/// Trust and credential keys that must hold strings when present
const STRING_OPTION_SUFFIXES: [&str; 5] = [
    "_root_ca_file",
    "_root_ca_pem",
    "_spki_hash",
    "credentials_file",
    "base_url",
];

/// Configuration validator with additional validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Require every enabled profile to name a built-in provider
    builtin_only: bool,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject profiles whose provider is not a built-in
    pub fn builtin_only(mut self) -> Self {
        self.builtin_only = true;
        self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &PolyllmConfig) -> Result<(), ValidationError> {
        config.validate()?;

        self.validate_enabled(config)?;
        self.validate_providers(config)?;
        self.validate_provider_requirements(config)?;
        self.validate_option_types(config)?;

        Ok(())
    }

    fn validate_enabled(&self, config: &PolyllmConfig) -> Result<(), ValidationError> {
        if config.enabled_profiles().next().is_none() {
            return Err(ValidationError::new("profiles", ValidationErrorKind::NoEnabledProfile));
        }
        Ok(())
    }

    fn validate_providers(&self, config: &PolyllmConfig) -> Result<(), ValidationError> {
        if !self.builtin_only {
            return Ok(());
        }
        for (i, profile) in config.profiles.iter().enumerate() {
            if profile.enabled && !profile.provider.is_builtin() {
                return Err(ValidationError::new(
                    format!("profiles[{i}].provider"),
                    ValidationErrorKind::UnknownProvider {
                        provider: profile.provider.to_string(),
                    },
                ));
            }
        }
        Ok(())
    }

    /// Requirements adapters would otherwise only report at construction
    fn validate_provider_requirements(&self, config: &PolyllmConfig) -> Result<(), ValidationError> {
        for (i, profile) in config.profiles.iter().enumerate().filter(|(_, p)| p.enabled) {
            let options = config.options_for(profile);
            let path = format!("profiles[{i}]");
            match profile.provider.as_str() {
                ProviderId::VERTEX if options.project_id.is_empty() => {
                    return Err(required_by(format!("{path}.project_id"), ProviderId::VERTEX));
                }
                ProviderId::CUSTOM
                    if ENDPOINT_OPTIONS
                        .iter()
                        .all(|key| options.provider_option_str(key).is_none()) =>
                {
                    return Err(required_by(format!("{path}.provider_options.url"), ProviderId::CUSTOM));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_option_types(&self, config: &PolyllmConfig) -> Result<(), ValidationError> {
        for (i, profile) in config.profiles.iter().enumerate() {
            let Some(options) = &profile.provider_options else {
                continue;
            };
            for (key, value) in options {
                let string_only = STRING_OPTION_SUFFIXES
                    .iter()
                    .any(|suffix| key.ends_with(suffix));
                if string_only && !matches!(value, Value::String(_) | Value::Null) {
                    return Err(ValidationError::new(
                        format!("profiles[{i}].provider_options.{key}"),
                        ValidationErrorKind::not_a_string(value),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn required_by(field_path: String, provider: &str) -> ValidationError {
    ValidationError::new(
        field_path,
        ValidationErrorKind::RequiredByProvider {
            provider: provider.to_string(),
        },
    )
}
