//! OpenRouter provider implementation
//!
//! OpenRouter speaks the OpenAI wire format; only the base URL and default
//! model differ.

use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    base_url, call_span, log_request, provider_id_or, require_api_key, resolve_call, vendor_http,
    LlmProvider,
};
use crate::providers::openai_compat::OpenAiCompatible;
use crate::providers::{ProviderId, ProviderResult};
use async_trait::async_trait;
use tracing::{debug, Instrument};

/// OpenRouter provider
#[derive(Debug)]
pub struct OpenRouterProvider {
    id: ProviderId,
    options: LlmOptions,
    api: OpenAiCompatible,
}

impl OpenRouterProvider {
    pub const DEFAULT_MODEL: &'static str = "openrouter/auto";
    pub const BASE_URL: &'static str = "https://openrouter.ai/api/v1";

    pub fn new(mut options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::OPENROUTER);
        require_api_key(&id, &options)?;

        let http = vendor_http(&id, ProviderId::OPENROUTER, &options)?;
        let api = OpenAiCompatible::new(http, base_url(&options, Self::BASE_URL));

        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }

        debug!(provider = %id, base_url = api.base_url(), "Created OpenRouter provider");
        Ok(Self { id, options, api })
    }

    async fn chat(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        log_request(&resolved, system_prompt, user_prompt);
        self.api
            .chat(resolved.api_key.expose_secret(), &resolved, system_prompt, user_prompt)
            .await
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    fn options(&self) -> &LlmOptions {
        &self.options
    }

    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        overrides: &LlmOptions,
    ) -> ProviderResult<String> {
        let resolved = resolve_call(&self.options, overrides, OutputFormat::Text);
        let span = call_span(&self.id, "generate_text", &resolved);
        self.chat(resolved, system_prompt, user_prompt)
            .instrument(span)
            .await
    }

    async fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        overrides: &LlmOptions,
    ) -> ProviderResult<String> {
        let resolved = resolve_call(&self.options, overrides, OutputFormat::Json);
        let span = call_span(&self.id, "generate_json", &resolved);
        self.chat(resolved, system_prompt, user_prompt)
            .instrument(span)
            .await
    }

    async fn generate_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let span = call_span(&self.id, "generate_embedding", &self.options);
        self.api
            .embedding(self.options.api_key.expose_secret(), &self.options.model, text)
            .instrument(span)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let provider = OpenRouterProvider::new(LlmOptions::new().with_api_key("or-key")).unwrap();
        assert_eq!(provider.options().model, OpenRouterProvider::DEFAULT_MODEL);
        assert_eq!(provider.api.base_url(), OpenRouterProvider::BASE_URL);
        assert_eq!(provider.provider_id().as_str(), ProviderId::OPENROUTER);
    }

    #[tokio::test]
    async fn test_image_generation_is_unsupported() {
        let provider = OpenRouterProvider::new(LlmOptions::new().with_api_key("or-key")).unwrap();
        let err = provider
            .generate_image("a cat", &LlmOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::providers::ProviderError::Unsupported { .. }));
    }
}
