//! Configuration schema structures with serde support
//!
//! A config file names a set of provider profiles. Each profile becomes the
//! base [`LlmOptions`] of one adapter; file-level `defaults` sit underneath
//! every profile and are layered with the same resolver used for per-call
//! overrides.

use super::error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
use super::secrets::{redact_by_field_name, SafeLogging, SecretString};
use crate::options::{merge_options, LlmOptions, OutputFormat, ProviderOptions};
use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Schema version accepted by this release
pub const SUPPORTED_VERSION: &str = "0.1";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolyllmConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Settings shared by every profile
    #[serde(default)]
    pub defaults: ProfileDefaults,

    /// Named provider profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// Custom metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Values applied underneath every profile
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDefaults {
    #[serde(default)]
    pub output_format: Option<OutputFormat>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub verbose: Option<bool>,

    #[serde(default)]
    pub provider_options: Option<ProviderOptions>,
}

/// One named provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Unique profile name
    pub name: String,

    /// Registry identifier of the provider
    pub provider: ProviderId,

    /// API key (supports environment variable interpolation)
    #[serde(default, skip_serializing_if = "SecretString::is_empty")]
    pub api_key: SecretString,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub output_format: Option<OutputFormat>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub verbose: Option<bool>,

    /// Provider-specific settings (base_url, trust material, credentials)
    #[serde(default)]
    pub provider_options: Option<ProviderOptions>,

    /// Whether this profile may be used
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ProfileDefaults {
    fn to_options(&self) -> LlmOptions {
        LlmOptions {
            output_format: self.output_format,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            verbose: self.verbose,
            provider_options: self.provider_options.clone(),
            ..LlmOptions::default()
        }
    }
}

impl Profile {
    /// The profile's own settings, without file-level defaults
    pub fn to_options(&self) -> LlmOptions {
        LlmOptions {
            provider: Some(self.provider.clone()),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            output_format: self.output_format,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            verbose: self.verbose,
            provider_options: self.provider_options.clone(),
            ..LlmOptions::default()
        }
    }

    /// Validate profile configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::missing(format!("{}.name", path)));
        }

        if self.provider.as_str().trim().is_empty() {
            return Err(ValidationError::missing(format!("{}.provider", path)));
        }

        validate_temperature(self.temperature, &format!("{}.temperature", path))?;

        if let Some(options) = &self.provider_options {
            validate_base_url(options, &format!("{}.provider_options", path))?;
        }

        Ok(())
    }
}

impl SafeLogging for Profile {
    fn safe_for_logging(&self) -> String {
        let mut line = format!(
            "profile={} provider={} model={} api_key={}",
            self.name,
            self.provider,
            self.model,
            self.api_key.partial_redact()
        );
        if let Some(options) = &self.provider_options {
            let mut keys: Vec<&String> = options.keys().collect();
            keys.sort();
            for key in keys {
                line.push_str(&format!(" {}={}", key, redact_by_field_name(key, &options[key])));
            }
        }
        line
    }
}

impl PolyllmConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::missing("version"));
        }

        if self.version != SUPPORTED_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    found: self.version.clone(),
                },
            ));
        }

        if self.profiles.is_empty() {
            return Err(ValidationError::missing("profiles"));
        }

        validate_temperature(self.defaults.temperature, "defaults.temperature")?;
        if let Some(options) = &self.defaults.provider_options {
            validate_base_url(options, "defaults.provider_options")?;
        }

        let mut seen_names = HashSet::new();
        for (i, profile) in self.profiles.iter().enumerate() {
            if !seen_names.insert(profile.name.as_str()) {
                return Err(ValidationError::new(
                    format!("profiles[{}].name", i),
                    ValidationErrorKind::DuplicateProfile {
                        name: profile.name.clone(),
                    },
                ));
            }

            profile.validate(&format!("profiles[{}]", i))?;
        }

        Ok(())
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles that are enabled, in file order
    pub fn enabled_profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().filter(|p| p.enabled)
    }

    /// Base options for `profile`: file defaults overridden by the profile
    pub fn options_for(&self, profile: &Profile) -> LlmOptions {
        merge_options(&self.defaults.to_options(), &profile.to_options())
    }

    /// Base options for the enabled profile called `name`
    pub fn profile_options(&self, name: &str) -> ConfigResult<LlmOptions> {
        let profile = self.profile(name).ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
        })?;
        if !profile.enabled {
            return Err(ConfigError::DisabledProfile {
                name: name.to_string(),
            });
        }
        Ok(self.options_for(profile))
    }
}

fn validate_temperature(temperature: Option<f64>, path: &str) -> Result<(), ValidationError> {
    match temperature {
        Some(value) if !(0.0..=2.0).contains(&value) => Err(ValidationError::new(
            path,
            ValidationErrorKind::OutOfRange {
                value,
                min: 0.0,
                max: 2.0,
            },
        )),
        _ => Ok(()),
    }
}

fn validate_base_url(options: &ProviderOptions, path: &str) -> Result<(), ValidationError> {
    let Some(value) = options.get("base_url") else {
        return Ok(());
    };
    let field = format!("{}.base_url", path);
    let Some(raw) = value.as_str() else {
        return Err(ValidationError::new(field, ValidationErrorKind::not_a_string(value)));
    };

    match url::Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ValidationError::new(
            field,
            ValidationErrorKind::InvalidUrl {
                message: format!("URL scheme must be http or https, got: {}", url.scheme()),
            },
        )),
        Err(e) => Err(ValidationError::new(
            field,
            ValidationErrorKind::InvalidUrl {
                message: e.to_string(),
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(name: &str, provider: &str) -> Profile {
        Profile {
            name: name.to_string(),
            provider: ProviderId::new(provider),
            api_key: SecretString::default(),
            model: String::new(),
            project_id: String::new(),
            region: String::new(),
            output_format: None,
            max_tokens: None,
            temperature: None,
            verbose: None,
            provider_options: None,
            enabled: true,
        }
    }

    fn config(profiles: Vec<Profile>) -> PolyllmConfig {
        PolyllmConfig {
            version: SUPPORTED_VERSION.to_string(),
            defaults: ProfileDefaults::default(),
            profiles,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config(vec![profile("a", "openai"), profile("b", "mock")]).validate().is_ok());
    }

    #[test]
    fn test_version_mismatch() {
        let mut cfg = config(vec![profile("a", "openai")]);
        cfg.version = "2.0".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_profiles_required() {
        let err = config(vec![]).validate().unwrap_err();
        assert_eq!(err.field_path, "profiles");
    }

    #[test]
    fn test_duplicate_profile_names() {
        let err = config(vec![profile("a", "openai"), profile("a", "gemini")])
            .validate()
            .unwrap_err();
        assert_eq!(err.field_path, "profiles[1].name");
        assert!(matches!(err.kind, ValidationErrorKind::DuplicateProfile { .. }));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut p = profile("a", "openai");
        p.temperature = Some(2.5);
        let err = config(vec![p]).validate().unwrap_err();
        assert_eq!(err.field_path, "profiles[0].temperature");
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut p = profile("a", "custom");
        p.provider_options = Some(HashMap::from([("base_url".to_string(), json!("ftp://x"))]));
        let err = config(vec![p]).validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));

        let mut p = profile("a", "custom");
        p.provider_options = Some(HashMap::from([("base_url".to_string(), json!(5))]));
        let err = config(vec![p]).validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::NotAString { found: "number" }));
    }

    #[test]
    fn test_profile_overrides_defaults() {
        let mut cfg = config(vec![profile("a", "openai")]);
        cfg.defaults.max_tokens = Some(256);
        cfg.defaults.temperature = Some(0.2);
        cfg.profiles[0].temperature = Some(0.0);
        cfg.profiles[0].model = "gpt-4o".to_string();

        let options = cfg.options_for(&cfg.profiles[0]);
        assert_eq!(options.provider.as_ref().map(ProviderId::as_str), Some("openai"));
        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.max_tokens, Some(256));
        assert_eq!(options.temperature, Some(0.0));
    }

    #[test]
    fn test_profile_provider_options_replace_defaults() {
        let mut cfg = config(vec![profile("a", "custom")]);
        cfg.defaults.provider_options = Some(HashMap::from([("a".to_string(), json!(1))]));
        cfg.profiles[0].provider_options = Some(HashMap::from([("b".to_string(), json!(2))]));

        let options = cfg.options_for(&cfg.profiles[0]);
        assert_eq!(options.provider_option("a"), None);
        assert_eq!(options.provider_option("b"), Some(&json!(2)));
    }

    #[test]
    fn test_profile_options_lookup() {
        let mut disabled = profile("old", "openai");
        disabled.enabled = false;
        let cfg = config(vec![profile("a", "mock"), disabled]);

        assert!(cfg.profile_options("a").is_ok());
        assert!(matches!(
            cfg.profile_options("old"),
            Err(ConfigError::DisabledProfile { .. })
        ));
        assert!(matches!(
            cfg.profile_options("missing"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_safe_for_logging_redacts_secrets() {
        let mut p = profile("prod", "vertex");
        p.api_key = SecretString::new("sk-1234567890abcdef");
        p.provider_options = Some(HashMap::from([
            ("credentials_json".to_string(), json!("{\"private_key\":\"x\"}")),
            ("base_url".to_string(), json!("https://vertex.test")),
        ]));

        let line = p.safe_for_logging();
        assert!(line.contains("api_key=sk-...cdef"));
        assert!(line.contains("credentials_json=[REDACTED]"));
        assert!(line.contains("base_url=https://vertex.test"));
        assert!(!line.contains("private_key"));
    }
}
