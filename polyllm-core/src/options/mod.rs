//! Layered call options for LLM providers
//!
//! Every adapter keeps one base [`LlmOptions`] captured at construction and
//! receives a per-call override on each generation request. The two are merged
//! with [`merge_options`] before anything is sent to a vendor.
//!
//! Presence rules:
//! - String fields treat `""` as "not specified". An override can therefore
//!   never force a string field back to empty.
//! - Numeric and boolean fields are `Option`s, so an explicit `0`, `0.0` or
//!   `false` is a real value and wins over the base.
//! - `provider_options` distinguishes an absent map (`None`) from a present
//!   one. A present override map replaces the base map wholesale.

mod merge;

pub use merge::merge_options;

use crate::config::SecretString;
use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Provider-specific settings keyed by name
pub type ProviderOptions = HashMap<String, Value>;

/// Output format requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "xml")]
    Xml,
    #[serde(rename = "yaml")]
    Yaml,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "image/png")]
    ImagePng,
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
}

impl OutputFormat {
    /// Wire name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Enum => "enum",
            OutputFormat::ImagePng => "image/png",
            OutputFormat::ImageJpeg => "image/jpeg",
        }
    }

    /// MIME type a vendor should be asked to respond with
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain",
            OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
            OutputFormat::Yaml => "application/yaml",
            OutputFormat::Enum => "text/x.enum",
            OutputFormat::ImagePng => "image/png",
            OutputFormat::ImageJpeg => "image/jpeg",
        }
    }

    /// Whether the format asks for binary image output
    pub fn is_image(&self) -> bool {
        matches!(self, OutputFormat::ImagePng | OutputFormat::ImageJpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one generation call, composed from a base and an override
///
/// Equality compares spans by [`tracing::Span::id`]. Two disabled spans (no
/// subscriber took them) are therefore equal.
#[derive(Debug, Clone, Default)]
pub struct LlmOptions {
    /// Which provider to use (registry key)
    pub provider: Option<ProviderId>,

    /// Credential material for the provider
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// Project identifier (Vertex AI)
    pub project_id: String,

    /// Region (Vertex AI)
    pub region: String,

    /// Requested output format
    pub output_format: Option<OutputFormat>,

    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    ///
    /// Higher values (e.g. 0.8) make the output more random, lower values
    /// (e.g. 0.2) make it more focused and deterministic.
    pub temperature: Option<f64>,

    /// Log request details at info level instead of debug
    pub verbose: Option<bool>,

    /// Span that adapter log events are parented to
    pub span: Option<tracing::Span>,

    /// Additional options specific to the provider
    pub provider_options: Option<ProviderOptions>,

    /// Canned response returned by the mock provider
    pub mock_response: String,
}

impl PartialEq for LlmOptions {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.api_key == other.api_key
            && self.model == other.model
            && self.project_id == other.project_id
            && self.region == other.region
            && self.output_format == other.output_format
            && self.max_tokens == other.max_tokens
            && self.temperature == other.temperature
            && self.verbose == other.verbose
            && self.span.as_ref().map(tracing::Span::id) == other.span.as_ref().map(tracing::Span::id)
            && self.provider_options == other.provider_options
            && self.mock_response == other.mock_response
    }
}

impl LlmOptions {
    /// Create empty options (nothing specified)
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `overrides` on top of these options
    pub fn merged_with(&self, overrides: &LlmOptions) -> LlmOptions {
        merge_options(self, overrides)
    }

    /// True when no field is explicitly set
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.api_key.is_empty()
            && self.model.is_empty()
            && self.project_id.is_empty()
            && self.region.is_empty()
            && self.output_format.is_none()
            && self.max_tokens.is_none()
            && self.temperature.is_none()
            && self.verbose.is_none()
            && self.span.is_none()
            && self.provider_options.is_none()
            && self.mock_response.is_empty()
    }

    /// Resolved verbosity, `false` when unset
    pub fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    /// Raw extension value for `key`
    pub fn provider_option(&self, key: &str) -> Option<&Value> {
        self.provider_options.as_ref().and_then(|map| map.get(key))
    }

    /// Trimmed, non-empty string extension value for `key`
    ///
    /// Non-string values are treated as absent.
    pub fn provider_option_str(&self, key: &str) -> Option<&str> {
        self.provider_option(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn with_provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Replace the whole extension map
    pub fn with_provider_options(mut self, options: ProviderOptions) -> Self {
        self.provider_options = Some(options);
        self
    }

    /// Insert a single extension value, creating the map if needed
    pub fn with_provider_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.provider_options
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_mock_response(mut self, response: impl Into<String>) -> Self {
        self.mock_response = response.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_with_span_is_reflexive() {
        let disabled = LlmOptions::new().with_span(tracing::info_span!("call"));
        assert_eq!(disabled, disabled.clone());
        assert_ne!(disabled, LlmOptions::new());

        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let first = LlmOptions::new().with_span(tracing::info_span!("first"));
            let second = LlmOptions::new().with_span(tracing::info_span!("second"));
            assert_eq!(first, first.clone());
            assert_ne!(first, second);
        });
    }

    #[test]
    fn test_default_options_are_empty() {
        assert!(LlmOptions::new().is_empty());
        assert!(!LlmOptions::new().with_verbose(false).is_empty());
        assert!(!LlmOptions::new().with_max_tokens(0).is_empty());
        assert!(!LlmOptions::new()
            .with_provider_options(ProviderOptions::new())
            .is_empty());
    }

    #[test]
    fn test_provider_option_str_trims_and_skips_non_strings() {
        let options = LlmOptions::new()
            .with_provider_option("url", "  https://example.test/v1  ")
            .with_provider_option("blank", "   ")
            .with_provider_option("count", 3);

        assert_eq!(
            options.provider_option_str("url"),
            Some("https://example.test/v1")
        );
        assert_eq!(options.provider_option_str("blank"), None);
        assert_eq!(options.provider_option_str("count"), None);
        assert_eq!(options.provider_option_str("missing"), None);
    }

    #[test]
    fn test_output_format_wire_names() {
        assert_eq!(OutputFormat::ImagePng.as_str(), "image/png");
        assert_eq!(OutputFormat::Json.mime_type(), "application/json");
        assert!(OutputFormat::ImageJpeg.is_image());
        assert!(!OutputFormat::Text.is_image());

        let parsed: OutputFormat = serde_json::from_str("\"image/jpeg\"").unwrap();
        assert_eq!(parsed, OutputFormat::ImageJpeg);
    }
}
