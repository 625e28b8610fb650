//! Vendor HTTP executor built on reqwest

use crate::http::error::{map_send_error, map_status_error};
use crate::http::RequestOptions;
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info};

/// Maximum response size (10MB)
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Raw successful vendor response
#[derive(Debug, Clone)]
pub struct VendorResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl VendorResponse {
    /// Whether the vendor declared a JSON body
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> ProviderResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// JSON POST executor bound to one provider
///
/// Cloning is cheap: the reqwest client is reference counted internally.
#[derive(Debug, Clone)]
pub struct VendorHttp {
    provider: ProviderId,
    client: Client,
    max_response_size: usize,
}

impl VendorHttp {
    /// Wrap a client built by the transport layer
    pub fn new(provider: ProviderId, client: Client) -> Self {
        Self {
            provider,
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Override the response size cap
    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// POST `body` as JSON and parse the JSON answer
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<Value> {
        let response = self.post(url, headers, body, options).await?;
        response.json().map_err(|e| {
            error!(
                "Failed to parse response from {} [request_id: {}]: {}",
                self.provider, options.request_id, e
            );
            e
        })
    }

    /// POST `body` as JSON and return the raw successful response
    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<VendorResponse> {
        let request_id = options.request_id;
        info!(
            "Executing HTTP request to {} [request_id: {}]",
            self.provider, request_id
        );
        debug!("Request URL: {}", url);

        let mut builder = self
            .client
            .post(url)
            .json(body)
            .header("X-Request-ID", request_id.to_string());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(&self.provider, e, request_id))?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = self.read_body(response, options).await?;

        if !status.is_success() {
            error!(
                "Request failed with status {} for {} [request_id: {}]",
                status, self.provider, request_id
            );
            return Err(map_status_error(&self.provider, status, &body));
        }

        info!(
            "Request completed successfully for {} [request_id: {}]",
            self.provider, request_id
        );
        Ok(VendorResponse {
            status,
            content_type,
            body,
        })
    }

    async fn read_body(&self, mut response: Response, options: &RequestOptions) -> ProviderResult<String> {
        if let Some(length) = response.content_length() {
            if length as usize > self.max_response_size {
                return Err(self.too_large(length as usize, options));
            }
        }

        let mut buffer = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_send_error(&self.provider, e, options.request_id))?
        {
            if buffer.len() + chunk.len() > self.max_response_size {
                return Err(self.too_large(buffer.len() + chunk.len(), options));
            }
            buffer.extend_from_slice(&chunk);
        }

        String::from_utf8(buffer).map_err(|e| {
            ProviderError::Parse(format!(
                "response body is not UTF-8: {} [request_id: {}]",
                e, options.request_id
            ))
        })
    }

    fn too_large(&self, size: usize, options: &RequestOptions) -> ProviderError {
        error!(
            "Response size {} exceeds maximum {} for {} [request_id: {}]",
            size, self.max_response_size, self.provider, options.request_id
        );
        ProviderError::ResponseTooLarge {
            limit: self.max_response_size,
        }
    }
}
