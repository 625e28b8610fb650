//! Custom endpoint provider
//!
//! Talks to any OpenAI-compatible chat endpoint given by URL. Endpoints that
//! answer with plain text instead of a chat completion are accepted too: the
//! trimmed body is returned as is.

use crate::http::{RequestOptions, VendorHttp};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    call_span, log_request, provider_id_or, resolve_call, vendor_http, LlmProvider,
};
use crate::providers::openai_compat::{chat_body, chat_content};
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use async_trait::async_trait;
use tracing::{debug, Instrument};
use url::Url;

/// Extension keys checked for the endpoint, in order
pub const ENDPOINT_OPTIONS: [&str; 3] = ["url", "endpoint_url", "base_url"];

/// Custom endpoint provider
#[derive(Debug)]
pub struct CustomProvider {
    id: ProviderId,
    options: LlmOptions,
    endpoint: String,
    http: VendorHttp,
}

impl CustomProvider {
    pub const DEFAULT_MODEL: &'static str = "default";

    /// Create a provider for the configured endpoint
    ///
    /// The endpoint must be set and parse as an absolute URL.
    pub fn new(mut options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::CUSTOM);
        let endpoint = endpoint_from(&options)
            .ok_or_else(|| ProviderError::configuration(id.clone(), "endpoint url is required"))?
            .to_string();
        validate_endpoint(&id, &endpoint)?;

        let http = vendor_http(&id, ProviderId::CUSTOM, &options)?;

        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }

        debug!(provider = %id, endpoint = %endpoint, "Created custom provider");
        Ok(Self {
            id,
            options,
            endpoint,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chat(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        let endpoint = match endpoint_from(&resolved) {
            Some(url) if url != self.endpoint => {
                validate_endpoint(&self.id, url)?;
                url.to_string()
            }
            _ => self.endpoint.clone(),
        };

        log_request(&resolved, system_prompt, user_prompt);
        let body = chat_body(&resolved, system_prompt, user_prompt);

        let authorization = format!("Bearer {}", resolved.api_key.expose_secret());
        let mut headers = Vec::new();
        if !resolved.api_key.is_empty() {
            headers.push(("Authorization", authorization.as_str()));
        }

        let response = self
            .http
            .post(&endpoint, &headers, &body, &RequestOptions::new())
            .await?;

        // Plain-text fallback for endpoints that do not answer in chat format
        match response.json().ok().map(|value| chat_content(&value)) {
            Some(Ok(content)) => Ok(content),
            _ => Ok(response.body.trim().to_string()),
        }
    }
}

fn endpoint_from(options: &LlmOptions) -> Option<&str> {
    ENDPOINT_OPTIONS
        .iter()
        .find_map(|key| options.provider_option_str(key))
}

fn validate_endpoint(id: &ProviderId, endpoint: &str) -> ProviderResult<()> {
    Url::parse(endpoint)
        .map(|_| ())
        .map_err(|e| ProviderError::configuration(id.clone(), format!("invalid endpoint url '{endpoint}': {e}")))
}

#[async_trait]
impl LlmProvider for CustomProvider {
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
}
