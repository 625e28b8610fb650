//! Provider capability contract
//!
//! Every backend implements [`LlmProvider`]. Callers hold adapters as
//! `Arc<dyn LlmProvider>` obtained from the [`ProviderRegistry`](crate::registry::ProviderRegistry)
//! and never depend on the concrete type.

use crate::http::VendorHttp;
use crate::options::{merge_options, LlmOptions, OutputFormat};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::ProviderId;
use crate::transport::{SecureClientBuilder, TrustPolicy};
use async_trait::async_trait;
use tracing::{debug, info, Span};

/// Core provider trait that all LLM backends implement
///
/// The per-call `overrides` are merged over the adapter's base options with
/// [`merge_options`]; pass `&LlmOptions::default()` to use the base as is.
///
/// Request fields, the API key included, are read from the merged options of
/// each call. The transport and its trust settings are fixed at construction,
/// as are Vertex AI service-account credentials. Embedding calls take no
/// overrides and always use the base options.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Identifier the provider was constructed under
    fn provider_id(&self) -> &ProviderId;

    /// Base options captured at construction
    fn options(&self) -> &LlmOptions;

    /// Generate a plain text response
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        overrides: &LlmOptions,
    ) -> ProviderResult<String>;

    /// Generate a JSON response (returned as text)
    async fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        overrides: &LlmOptions,
    ) -> ProviderResult<String>;

    /// Generate an image and return its encoded bytes
    async fn generate_image(&self, prompt: &str, overrides: &LlmOptions) -> ProviderResult<Vec<u8>> {
        let _ = (prompt, overrides);
        Err(ProviderError::unsupported(
            self.provider_id().clone(),
            "image generation",
        ))
    }

    /// Generate an embedding vector for `text`
    async fn generate_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let _ = text;
        Err(ProviderError::unsupported(
            self.provider_id().clone(),
            "embedding generation",
        ))
    }
}

/// Appended to the system prompt of JSON calls for vendors without a JSON mode
pub(crate) const JSON_INSTRUCTION: &str =
    "\nYou must respond with valid JSON only. Do not include any text outside the JSON.";

/// Extension key overriding a vendor's base URL
pub(crate) const BASE_URL_OPTION: &str = "base_url";

/// Identifier an adapter runs under, `fallback` when constructed directly
pub(crate) fn provider_id_or(options: &LlmOptions, fallback: &str) -> ProviderId {
    options
        .provider
        .clone()
        .unwrap_or_else(|| ProviderId::new(fallback))
}

/// Fail construction when no API key was supplied
pub(crate) fn require_api_key(id: &ProviderId, options: &LlmOptions) -> ProviderResult<()> {
    if options.api_key.is_empty() {
        return Err(ProviderError::configuration(id.clone(), "api key is required"));
    }
    Ok(())
}

/// Base URL from the `base_url` extension, without a trailing slash
pub(crate) fn base_url(options: &LlmOptions, default: &str) -> String {
    options
        .provider_option_str(BASE_URL_OPTION)
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// HTTP executor over a hardened client for trust prefix `prefix`
///
/// Trust inputs are read from the base extension map and the environment
/// once, here. Per-call overrides never change the transport.
pub(crate) fn vendor_http(id: &ProviderId, prefix: &str, options: &LlmOptions) -> ProviderResult<VendorHttp> {
    let policy = TrustPolicy::from_env(prefix, options.provider_options.as_ref())?;
    let client = SecureClientBuilder::new().trust_policy(policy).build()?;
    Ok(VendorHttp::new(id.clone(), client))
}

/// Resolve the options for a text or JSON call, forcing the output format
pub(crate) fn resolve_call(base: &LlmOptions, overrides: &LlmOptions, format: OutputFormat) -> LlmOptions {
    let mut resolved = merge_options(base, overrides);
    resolved.output_format = Some(format);
    resolved
}

/// Resolve the options for an image call; non-image formats fall back to PNG
pub(crate) fn resolve_image_call(base: &LlmOptions, overrides: &LlmOptions) -> LlmOptions {
    let mut resolved = merge_options(base, overrides);
    resolved.output_format = Some(
        resolved
            .output_format
            .filter(OutputFormat::is_image)
            .unwrap_or(OutputFormat::ImagePng),
    );
    resolved
}

/// Span for one vendor call, parented to the configured logging span
pub(crate) fn call_span(provider: &ProviderId, operation: &'static str, resolved: &LlmOptions) -> Span {
    let parent = resolved.span.clone().unwrap_or_else(Span::current);
    tracing::info_span!(
        parent: &parent,
        "llm_call",
        provider = %provider,
        operation,
        model = %resolved.model,
    )
}

/// Log the outgoing request, at info level when verbose is set
pub(crate) fn log_request(resolved: &LlmOptions, system_prompt: &str, user_prompt: &str) {
    let format = resolved.output_format.map(|f| f.as_str()).unwrap_or("text");
    if resolved.is_verbose() {
        info!(
            model = %resolved.model,
            max_tokens = ?resolved.max_tokens,
            temperature = ?resolved.temperature,
            output_format = format,
            system_prompt_len = system_prompt.len(),
            user_prompt_len = user_prompt.len(),
            "Sending generation request"
        );
    } else {
        debug!(
            model = %resolved.model,
            output_format = format,
            system_prompt_len = system_prompt.len(),
            user_prompt_len = user_prompt.len(),
            "Sending generation request"
        );
    }
}
