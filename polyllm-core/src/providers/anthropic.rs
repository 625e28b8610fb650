//! Anthropic provider implementation
//!
//! Implements the capability contract over Anthropic's Messages API. This is
//! the adapter that usually runs behind a pinned transport: trust inputs use
//! the `anthropic` prefix (`anthropic_root_ca_pem`, `ANTHROPIC_EXPECTED_SPKI_HASH`, ...).

use crate::http::{RequestOptions, VendorHttp};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    base_url, call_span, log_request, provider_id_or, require_api_key, resolve_call, vendor_http,
    LlmProvider, JSON_INSTRUCTION,
};
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, Instrument};

/// Anthropic provider
#[derive(Debug)]
pub struct AnthropicProvider {
    id: ProviderId,
    options: LlmOptions,
    base_url: String,
    http: VendorHttp,
}

impl AnthropicProvider {
    pub const DEFAULT_MODEL: &'static str = "claude-3-opus-20240229";
    pub const BASE_URL: &'static str = "https://api.anthropic.com/v1";
    pub const API_VERSION: &'static str = "2023-06-01";

    /// Sent when no `max_tokens` is configured; the API requires one
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;

    /// Create a new Anthropic provider
    ///
    /// Fails when the API key is missing or the transport cannot be built.
    pub fn new(mut options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::ANTHROPIC);
        require_api_key(&id, &options)?;

        let http = vendor_http(&id, ProviderId::ANTHROPIC, &options)?;
        let base_url = base_url(&options, Self::BASE_URL);

        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }

        debug!(provider = %id, base_url = %base_url, "Created Anthropic provider");
        Ok(Self {
            id,
            options,
            base_url,
            http,
        })
    }

    fn messages_body(resolved: &LlmOptions, system_prompt: &str, user_prompt: &str) -> Value {
        let mut body = json!({
            "model": resolved.model,
            "max_tokens": resolved.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
            "temperature": resolved.temperature.unwrap_or(Self::DEFAULT_TEMPERATURE),
            "messages": [{"role": "user", "content": user_prompt}],
        });
        if !system_prompt.is_empty() {
            body["system"] = json!(system_prompt);
        }
        body
    }

    async fn messages(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        log_request(&resolved, system_prompt, user_prompt);
        let body = Self::messages_body(&resolved, system_prompt, user_prompt);
        let url = format!("{}/messages", self.base_url);
        let response = self
            .http
            .post_json(
                &url,
                &[
                    ("x-api-key", resolved.api_key.expose_secret()),
                    ("anthropic-version", Self::API_VERSION),
                ],
                &body,
                &RequestOptions::new(),
            )
            .await?;
        message_text(&response)
    }
}

/// Trimmed text of the first content block
fn message_text(response: &Value) -> ProviderResult<String> {
    response
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ProviderError::Parse("no text content in response".to_string()))
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
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
        self.messages(resolved, system_prompt, user_prompt)
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
        let system_prompt = format!("{system_prompt}{JSON_INSTRUCTION}");
        self.messages(resolved, &system_prompt, user_prompt)
            .instrument(span)
            .await
    }
}
