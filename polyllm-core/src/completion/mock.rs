//! Completion model with a canned answer

use super::{CompletionModel, CompletionRequest, CompletionResponse};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use async_trait::async_trait;
use std::fmt;

type ErrorFactory = Box<dyn Fn() -> ProviderError + Send + Sync>;

/// Completion model that never leaves the process
///
/// Returns its configured response, or an echo of the prompts when that
/// response has no text. An injected error is returned before the request
/// is looked at.
pub struct MockModel {
    id: ProviderId,
    options: LlmOptions,
    response: CompletionResponse,
    error: Option<ErrorFactory>,
}

impl MockModel {
    pub const DEFAULT_RESPONSE: &'static str = "This is a mock response";
    pub const DEFAULT_TOKENS: usize = 5;
    pub const DEFAULT_MODEL: &'static str = "mock-model";
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;

    pub fn new() -> Self {
        Self {
            id: ProviderId::new(ProviderId::MOCK),
            options: LlmOptions::new()
                .with_provider(ProviderId::MOCK)
                .with_output_format(OutputFormat::Text)
                .with_model(Self::DEFAULT_MODEL)
                .with_max_tokens(Self::DEFAULT_MAX_TOKENS)
                .with_temperature(Self::DEFAULT_TEMPERATURE),
            response: CompletionResponse::new(Self::DEFAULT_RESPONSE, Self::DEFAULT_TOKENS),
            error: None,
        }
    }

    /// Replace the options wholesale; the provider is always `mock`
    pub fn with_options(mut self, options: LlmOptions) -> Self {
        self.options = options.with_provider(ProviderId::MOCK);
        self
    }

    /// Answer every call with `response`; an empty text switches to echo
    pub fn with_response(mut self, response: CompletionResponse) -> Self {
        self.response = response;
        self
    }

    /// Fail every call with the error built by `error`
    pub fn with_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> ProviderError + Send + Sync + 'static,
    {
        self.error = Some(Box::new(error));
        self
    }

    fn echo(request: &CompletionRequest) -> CompletionResponse {
        let prompt = match (request.system_prompt.is_empty(), request.user_prompt.is_empty()) {
            (false, false) => format!("{}\n\n{}", request.system_prompt, request.user_prompt),
            (false, true) => request.system_prompt.clone(),
            _ => request.user_prompt.clone(),
        };
        let tokens_used = prompt.split_whitespace().count() + 1;
        CompletionResponse::new(format!("Echo: {}", prompt.trim()), tokens_used)
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockModel")
            .field("options", &self.options)
            .field("response", &self.response)
            .field("fails", &self.error.is_some())
            .finish()
    }
}

#[async_trait]
impl CompletionModel for MockModel {
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        if let Some(error) = &self.error {
            return Err(error());
        }
        if request.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "system and user prompt are both empty".to_string(),
            ));
        }
        if self.response.text.is_empty() {
            return Ok(Self::echo(request));
        }
        Ok(self.response.clone())
    }

    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    fn options(&self) -> &LlmOptions {
        &self.options
    }
}
