//! Gemini provider implementation
//!
//! Google AI `generateContent` and `embedContent` over REST, authenticated
//! with an API key. The request and response shapes are shared with Vertex AI.

use crate::http::{RequestOptions, VendorHttp};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    base_url, call_span, log_request, provider_id_or, require_api_key, resolve_call, vendor_http,
    LlmProvider, JSON_INSTRUCTION,
};
use crate::providers::openai_compat::float_vector;
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, Instrument};

/// `generateContent` request body
///
/// JSON calls get the JSON instruction appended to the system prompt as well
/// as a JSON response MIME type.
pub(crate) fn generate_content_body(resolved: &LlmOptions, system_prompt: &str, user_prompt: &str) -> Value {
    let format = resolved.output_format.unwrap_or(OutputFormat::Text);
    let system_prompt = if format == OutputFormat::Json {
        format!("{system_prompt}{JSON_INSTRUCTION}")
    } else {
        system_prompt.to_string()
    };

    let mut generation_config = json!({
        "candidateCount": 1,
        "responseMimeType": format.mime_type(),
    });
    if let Some(max_tokens) = resolved.max_tokens {
        generation_config["maxOutputTokens"] = json!(max_tokens);
    }
    if let Some(temperature) = resolved.temperature {
        generation_config["temperature"] = json!(temperature);
    }

    let mut body = json!({
        "contents": [{"role": "user", "parts": [{"text": user_prompt}]}],
        "generationConfig": generation_config,
    });
    if !system_prompt.is_empty() {
        body["systemInstruction"] = json!({"parts": [{"text": system_prompt}]});
    }
    body
}

/// Concatenated text parts of the first candidate, trimmed
pub(crate) fn candidate_text(response: &Value) -> ProviderResult<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .filter(|parts| !parts.is_empty())
        .ok_or_else(|| ProviderError::Parse("no candidates in response".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::Parse("empty response".to_string()));
    }
    Ok(text.to_string())
}

/// Gemini provider
#[derive(Debug)]
pub struct GeminiProvider {
    id: ProviderId,
    options: LlmOptions,
    base_url: String,
    http: VendorHttp,
}

impl GeminiProvider {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    pub const EMBEDDING_MODEL: &'static str = "embedding-001";
    pub const BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(mut options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::GEMINI);
        require_api_key(&id, &options)?;

        let http = vendor_http(&id, ProviderId::GEMINI, &options)?;
        let base_url = base_url(&options, Self::BASE_URL);

        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }

        debug!(provider = %id, base_url = %base_url, "Created Gemini provider");
        Ok(Self {
            id,
            options,
            base_url,
            http,
        })
    }

    async fn post(&self, url: &str, api_key: &str, body: &Value) -> ProviderResult<Value> {
        self.http
            .post_json(
                url,
                &[("x-goog-api-key", api_key)],
                body,
                &RequestOptions::new(),
            )
            .await
    }

    async fn generate(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        log_request(&resolved, system_prompt, user_prompt);
        let body = generate_content_body(&resolved, system_prompt, user_prompt);
        let url = format!("{}/models/{}:generateContent", self.base_url, resolved.model);
        let response = self.post(&url, resolved.api_key.expose_secret(), &body).await?;
        candidate_text(&response)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
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
        self.generate(resolved, system_prompt, user_prompt)
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
        self.generate(resolved, system_prompt, user_prompt)
            .instrument(span)
            .await
    }

    async fn generate_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let span = call_span(&self.id, "generate_embedding", &self.options);
        let body = json!({
            "model": format!("models/{}", Self::EMBEDDING_MODEL),
            "content": {"parts": [{"text": text}]},
        });
        let url = format!("{}/models/{}:embedContent", self.base_url, Self::EMBEDDING_MODEL);
        async {
            let response = self.post(&url, self.options.api_key.expose_secret(), &body).await?;
            let values = response
                .pointer("/embedding/values")
                .and_then(Value::as_array)
                .ok_or_else(|| ProviderError::Parse("no embedding in response".to_string()))?;
            float_vector(values)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_adds_instruction_and_mime_type() {
        let resolved = LlmOptions::new()
            .with_output_format(OutputFormat::Json)
            .with_max_tokens(0);
        let body = generate_content_body(&resolved, "sys", "hi");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            json!(format!("sys{JSON_INSTRUCTION}"))
        );
        assert_eq!(body["generationConfig"]["responseMimeType"], json!("application/json"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], json!(0));
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_text_body_without_system_prompt() {
        let resolved = LlmOptions::new().with_output_format(OutputFormat::Text);
        let body = generate_content_body(&resolved, "", "hi");
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["generationConfig"]["responseMimeType"], json!("text/plain"));
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world "}]}}]
        });
        assert_eq!(candidate_text(&response).unwrap(), "Hello, world");
        assert!(candidate_text(&json!({"candidates": []})).is_err());
        assert!(candidate_text(&json!({"candidates": [{"content": {"parts": [{"text": " "}]}}]})).is_err());
    }

    #[test]
    fn test_defaults() {
        let provider = GeminiProvider::new(LlmOptions::new().with_api_key("g-key")).unwrap();
        assert_eq!(provider.options().model, GeminiProvider::DEFAULT_MODEL);
        assert!(GeminiProvider::new(LlmOptions::new()).is_err());
    }
}
