//! In-memory provider for tests
//!
//! Returns the configured `mock_response` and records the resolved options of
//! recent calls so tests can assert on override behavior. Only the last
//! [`MAX_RECORDED_CALLS`] calls are kept.

use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{call_span, log_request, resolve_call, resolve_image_call, LlmProvider};
use crate::providers::{ProviderId, ProviderResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::Instrument;

/// Fixed embedding returned for any input
pub const MOCK_EMBEDDING: [f32; 3] = [0.1, 0.2, 0.3];

/// Calls retained by [`MockProvider::observed_options`]
pub const MAX_RECORDED_CALLS: usize = 16;

/// Mock provider
#[derive(Debug)]
pub struct MockProvider {
    id: ProviderId,
    options: LlmOptions,
    calls: Mutex<VecDeque<LlmOptions>>,
}

impl MockProvider {
    pub const DEFAULT_MODEL: &'static str = "mock-model";

    /// Create a mock provider; never fails
    pub fn new(mut options: LlmOptions) -> Self {
        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }
        let id = options
            .provider
            .clone()
            .unwrap_or_else(|| ProviderId::new(ProviderId::MOCK));
        Self {
            id,
            options,
            calls: Mutex::new(VecDeque::with_capacity(MAX_RECORDED_CALLS)),
        }
    }

    /// Resolved options of the retained calls, oldest first
    pub fn observed_options(&self) -> Vec<LlmOptions> {
        self.calls.lock().iter().cloned().collect()
    }

    /// Resolved options of the most recent call
    pub fn last_options(&self) -> Option<LlmOptions> {
        self.calls.lock().back().cloned()
    }

    fn respond(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> String {
        log_request(&resolved, system_prompt, user_prompt);
        let response = resolved.mock_response.clone();
        let mut calls = self.calls.lock();
        if calls.len() == MAX_RECORDED_CALLS {
            calls.pop_front();
        }
        calls.push_back(resolved);
        response
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
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
        async { Ok(self.respond(resolved, system_prompt, user_prompt)) }
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
        async { Ok(self.respond(resolved, system_prompt, user_prompt)) }
            .instrument(span)
            .await
    }

    async fn generate_image(&self, prompt: &str, overrides: &LlmOptions) -> ProviderResult<Vec<u8>> {
        let resolved = resolve_image_call(&self.options, overrides);
        self.respond(resolved, "", prompt);
        Ok(Vec::new())
    }

    async fn generate_embedding(&self, _text: &str) -> ProviderResult<Vec<f32>> {
        Ok(MOCK_EMBEDDING.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let provider = MockProvider::new(LlmOptions::new());
        assert_eq!(provider.options().model, MockProvider::DEFAULT_MODEL);
        assert_eq!(provider.provider_id().as_str(), ProviderId::MOCK);
    }

    #[tokio::test]
    async fn test_override_response_wins() {
        let provider = MockProvider::new(LlmOptions::new().with_mock_response("base"));

        let base = provider.generate_text("", "hi", &LlmOptions::new()).await.unwrap();
        assert_eq!(base, "base");

        let overridden = provider
            .generate_text("", "hi", &LlmOptions::new().with_mock_response("call"))
            .await
            .unwrap();
        assert_eq!(overridden, "call");
    }

    #[tokio::test]
    async fn test_records_resolved_options() {
        let provider = MockProvider::new(
            LlmOptions::new()
                .with_model("base-model")
                .with_max_tokens(100)
                .with_verbose(true),
        );

        provider
            .generate_json(
                "sys",
                "user",
                &LlmOptions::new().with_max_tokens(0).with_verbose(false),
            )
            .await
            .unwrap();

        let seen = provider.last_options().unwrap();
        assert_eq!(seen.model, "base-model");
        assert_eq!(seen.max_tokens, Some(0));
        assert_eq!(seen.verbose, Some(false));
        assert_eq!(seen.output_format, Some(OutputFormat::Json));
        assert_eq!(provider.observed_options().len(), 1);
    }

    #[tokio::test]
    async fn test_call_history_is_bounded() {
        let provider = MockProvider::new(LlmOptions::new());
        for tokens in 0..(MAX_RECORDED_CALLS as u32 + 4) {
            provider
                .generate_text("", "hi", &LlmOptions::new().with_max_tokens(tokens))
                .await
                .unwrap();
        }

        let seen = provider.observed_options();
        assert_eq!(seen.len(), MAX_RECORDED_CALLS);
        assert_eq!(seen[0].max_tokens, Some(4));
        assert_eq!(
            provider.last_options().unwrap().max_tokens,
            Some(MAX_RECORDED_CALLS as u32 + 3)
        );
    }

    #[tokio::test]
    async fn test_image_and_embedding() {
        let provider = MockProvider::new(LlmOptions::new());
        assert!(provider
            .generate_image("a cat", &LlmOptions::new())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            provider.last_options().unwrap().output_format,
            Some(OutputFormat::ImagePng)
        );
        assert_eq!(
            provider.generate_embedding("x").await.unwrap(),
            vec![0.1, 0.2, 0.3]
        );
    }
}
