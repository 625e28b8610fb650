//! Single-call completion models
//!
//! A [`CompletionModel`] is a provider bound to one output format. Each
//! [`complete`](CompletionModel::complete) call takes a system and user
//! prompt and returns the text with an estimated token count. Models are
//! built with [`new_model`] or the per-format factories [`text_model`],
//! [`json_model`] and [`image_model`]. [`MockModel`] stands in for a real
//! backend in tests.

mod factory;
mod mock;

pub use factory::{image_model, json_model, new_model, new_model_with, text_model};
pub use mock::MockModel;

use crate::config::SecretString;
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::{LlmProvider, ProviderError, ProviderId, ProviderResult};
use crate::tokens::count_tokens;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One completion call
///
/// `max_tokens` and `temperature` override the model's configuration when
/// set. Leaving them `None` keeps the configured values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Both prompts empty
    pub fn is_empty(&self) -> bool {
        self.system_prompt.is_empty() && self.user_prompt.is_empty()
    }

    /// Per-call overrides carried by the request
    fn overrides(&self) -> LlmOptions {
        LlmOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..Default::default()
        }
    }
}

/// Result of a completion call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text; base64 of the image bytes for image models
    pub text: String,
    /// Estimated tokens consumed by the prompts and the response
    pub tokens_used: usize,
}

impl CompletionResponse {
    pub fn new(text: impl Into<String>, tokens_used: usize) -> Self {
        Self {
            text: text.into(),
            tokens_used,
        }
    }
}

/// A provider bound to one output format
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse>;

    /// Identifier of the backing provider
    fn provider_id(&self) -> &ProviderId;

    /// Options the model was built with
    fn options(&self) -> &LlmOptions;

    fn output_format(&self) -> OutputFormat {
        self.options().output_format.unwrap_or(OutputFormat::Text)
    }

    fn model(&self) -> &str {
        &self.options().model
    }

    fn api_key(&self) -> &SecretString {
        &self.options().api_key
    }

    fn max_tokens(&self) -> Option<u32> {
        self.options().max_tokens
    }

    fn temperature(&self) -> Option<f64> {
        self.options().temperature
    }

    fn project_id(&self) -> &str {
        &self.options().project_id
    }

    fn region(&self) -> &str {
        &self.options().region
    }

    fn is_verbose(&self) -> bool {
        self.options().is_verbose()
    }
}

/// Completion model over any registered [`LlmProvider`]
///
/// JSON models call `generate_json`, image models call `generate_image`
/// with the user prompt and return the bytes base64 encoded. Every other
/// format calls `generate_text`.
pub struct ProviderModel {
    provider: Arc<dyn LlmProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// The wrapped adapter
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }
}

impl fmt::Debug for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderModel")
            .field("provider", self.provider.provider_id())
            .field("model", &self.provider.options().model)
            .finish()
    }
}

#[async_trait]
impl CompletionModel for ProviderModel {
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        if request.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "system and user prompt are both empty".to_string(),
            ));
        }

        let overrides = request.overrides();
        let prompt_tokens = count_tokens(&request.system_prompt) + count_tokens(&request.user_prompt);
        let format = self.output_format();
        debug!(provider = %self.provider_id(), format = %format, "Running completion");

        let response = if format.is_image() {
            let bytes = self
                .provider
                .generate_image(&request.user_prompt, &overrides)
                .await?;
            CompletionResponse::new(STANDARD.encode(bytes), prompt_tokens)
        } else {
            let text = match format {
                OutputFormat::Json => {
                    self.provider
                        .generate_json(&request.system_prompt, &request.user_prompt, &overrides)
                        .await?
                }
                _ => {
                    self.provider
                        .generate_text(&request.system_prompt, &request.user_prompt, &overrides)
                        .await?
                }
            };
            let tokens_used = prompt_tokens + count_tokens(&text);
            CompletionResponse::new(text, tokens_used)
        };
        Ok(response)
    }

    fn provider_id(&self) -> &ProviderId {
        self.provider.provider_id()
    }

    fn options(&self) -> &LlmOptions {
        self.provider.options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn model(options: LlmOptions) -> (Arc<MockProvider>, ProviderModel) {
        let provider = Arc::new(MockProvider::new(options));
        (provider.clone(), ProviderModel::new(provider))
    }

    #[tokio::test]
    async fn test_request_limits_override_configuration() {
        let (mock, model) = model(
            LlmOptions::new()
                .with_max_tokens(4096)
                .with_temperature(0.7)
                .with_mock_response("two words"),
        );
        let request = CompletionRequest::new("sys", "user").with_temperature(0.0);
        let response = model.complete(&request).await.unwrap();
        assert_eq!(response.text, "two words");
        assert_eq!(response.tokens_used, 4);

        let seen = mock.last_options().unwrap();
        assert_eq!(seen.temperature, Some(0.0));
        assert_eq!(seen.max_tokens, Some(4096));
        assert_eq!(seen.output_format, Some(OutputFormat::Text));
    }

    #[tokio::test]
    async fn test_json_model_calls_json_generation() {
        let (mock, model) = model(
            LlmOptions::new()
                .with_output_format(OutputFormat::Json)
                .with_mock_response("{}"),
        );
        model.complete(&CompletionRequest::new("", "give json")).await.unwrap();
        assert_eq!(
            mock.last_options().unwrap().output_format,
            Some(OutputFormat::Json)
        );
    }

    #[tokio::test]
    async fn test_image_model_encodes_bytes() {
        let (mock, model) = model(LlmOptions::new().with_output_format(OutputFormat::ImageJpeg));
        let response = model
            .complete(&CompletionRequest::new("", "a red square"))
            .await
            .unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.tokens_used, 3);
        assert_eq!(
            mock.last_options().unwrap().output_format,
            Some(OutputFormat::ImageJpeg)
        );
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected_before_the_provider() {
        let (mock, model) = model(LlmOptions::new());
        let err = model.complete(&CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(mock.last_options().is_none());
    }

    #[test]
    fn test_accessors_read_options() {
        let (_, model) = model(
            LlmOptions::new()
                .with_project_id("proj")
                .with_region("europe-west4")
                .with_verbose(true),
        );
        assert_eq!(model.provider_id().as_str(), ProviderId::MOCK);
        assert_eq!(model.model(), MockProvider::DEFAULT_MODEL);
        assert_eq!(model.output_format(), OutputFormat::Text);
        assert_eq!(model.project_id(), "proj");
        assert_eq!(model.region(), "europe-west4");
        assert!(model.is_verbose());
        assert!(model.api_key().is_empty());
        assert_eq!(model.max_tokens(), None);
    }
}
