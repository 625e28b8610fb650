//! OpenAI-compatible wire format
//!
//! Shared by the OpenAI, OpenRouter and custom adapters: one chat request
//! shape, one embeddings request shape, and the matching extractions.

use crate::http::{RequestOptions, VendorHttp};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::{ProviderError, ProviderResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

/// Chat completions request body
pub(crate) fn chat_body(resolved: &LlmOptions, system_prompt: &str, user_prompt: &str) -> Value {
    let mut messages = Vec::with_capacity(2);
    if !system_prompt.is_empty() {
        messages.push(json!({"role": "system", "content": system_prompt}));
    }
    messages.push(json!({"role": "user", "content": user_prompt}));

    let mut body = json!({
        "model": resolved.model,
        "messages": messages,
    });
    if let Some(max_tokens) = resolved.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = resolved.temperature {
        body["temperature"] = json!(temperature);
    }
    if resolved.output_format == Some(OutputFormat::Json) {
        body["response_format"] = json!({"type": "json_object"});
    }
    body
}

/// First choice's message content, trimmed
pub(crate) fn chat_content(response: &Value) -> ProviderResult<String> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ProviderError::Parse("no choices in response".to_string()))
}

/// First embedding vector of an embeddings response
pub(crate) fn embedding_vector(response: &Value) -> ProviderResult<Vec<f32>> {
    let values = response
        .pointer("/data/0/embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse("no embeddings in response".to_string()))?;
    float_vector(values)
}

pub(crate) fn float_vector(values: &[Value]) -> ProviderResult<Vec<f32>> {
    values
        .iter()
        .map(|value| {
            value
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| ProviderError::Parse("embedding contains a non-numeric value".to_string()))
        })
        .collect()
}

/// Decoded bytes of the first `b64_json` image
pub(crate) fn image_bytes(response: &Value) -> ProviderResult<Vec<u8>> {
    let encoded = response
        .pointer("/data/0/b64_json")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ProviderError::Parse("image payload missing in response".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| ProviderError::Parse(format!("failed to decode image data: {e}")))
}

/// Client for an OpenAI-compatible REST API
#[derive(Debug, Clone)]
pub(crate) struct OpenAiCompatible {
    http: VendorHttp,
    base_url: String,
}

impl OpenAiCompatible {
    pub(crate) fn new(http: VendorHttp, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn chat(
        &self,
        api_key: &str,
        resolved: &LlmOptions,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ProviderResult<String> {
        let body = chat_body(resolved, system_prompt, user_prompt);
        let url = format!("{}/chat/completions", self.base_url);
        let response = self.post(&url, api_key, &body).await?;
        chat_content(&response)
    }

    pub(crate) async fn embedding(&self, api_key: &str, model: &str, text: &str) -> ProviderResult<Vec<f32>> {
        let body = json!({"model": model, "input": [text]});
        let url = format!("{}/embeddings", self.base_url);
        let response = self.post(&url, api_key, &body).await?;
        embedding_vector(&response)
    }

    pub(crate) async fn image(&self, api_key: &str, model: &str, prompt: &str, size: &str) -> ProviderResult<Vec<u8>> {
        let body = json!({
            "model": model,
            "prompt": prompt,
            "size": size,
            "n": 1,
            "response_format": "b64_json",
        });
        let url = format!("{}/images/generations", self.base_url);
        let response = self.post(&url, api_key, &body).await?;
        image_bytes(&response)
    }

    async fn post(&self, url: &str, api_key: &str, body: &Value) -> ProviderResult<Value> {
        let authorization = format!("Bearer {api_key}");
        self.http
            .post_json(
                url,
                &[("Authorization", authorization.as_str())],
                body,
                &RequestOptions::new(),
            )
            .await
    }
}
