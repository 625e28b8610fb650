//! Vertex AI provider implementation
//!
//! Gemini models served from a Google Cloud project. Requests go to the
//! regional `generateContent` endpoint with a bearer token that is either the
//! configured API key or an access token exchanged from service-account
//! credentials (see [`CredentialSource`] for where those are looked up).

pub mod auth;

pub use auth::{ServiceAccountCredentials, ServiceAccountTokenProvider, VertexAuth};

use crate::http::{RequestOptions, VendorHttp};
use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    call_span, log_request, provider_id_or, resolve_call, vendor_http, LlmProvider,
};
use crate::providers::gemini::{candidate_text, generate_content_body};
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use crate::transport::{CredentialSource, SecureClientBuilder, TrustPolicy};
use async_trait::async_trait;
use tracing::{debug, Instrument};

pub const GEMINI_2_5_FLASH: &str = "gemini-2.5-flash";
pub const GEMINI_2_5_PRO: &str = "gemini-2.5-pro";

/// Map a configured model name onto a served Vertex model
///
/// Any name containing `pro` selects the pro model; everything else,
/// including an empty name, selects flash.
pub fn vertex_model_name(model: &str) -> &'static str {
    if model.contains("pro") {
        GEMINI_2_5_PRO
    } else {
        GEMINI_2_5_FLASH
    }
}

/// Vertex AI provider
#[derive(Debug)]
pub struct VertexProvider {
    id: ProviderId,
    options: LlmOptions,
    base_url: String,
    auth: VertexAuth,
    http: VendorHttp,
}

impl VertexProvider {
    pub const DEFAULT_REGION: &'static str = "us-central1";

    /// Create a new Vertex provider
    ///
    /// Requires a project id, and either service-account credentials or an
    /// API key. A configured credentials file must exist.
    pub fn new(mut options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::VERTEX);
        if options.project_id.is_empty() {
            return Err(ProviderError::configuration(id, "project id is required"));
        }
        if options.region.is_empty() {
            options.region = Self::DEFAULT_REGION.to_string();
        }
        if options.model.is_empty() {
            options.model = GEMINI_2_5_FLASH.to_string();
        }

        let credentials = CredentialSource::from_env(options.provider_options.as_ref())?;
        let http = vendor_http(&id, ProviderId::VERTEX, &options)?;
        let auth = Self::auth(&id, &options, &credentials)?;

        let base_url = options
            .provider_option_str("base_url")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com/v1", options.region));

        debug!(
            provider = %id,
            project_id = %options.project_id,
            region = %options.region,
            "Created Vertex AI provider"
        );
        Ok(Self {
            id,
            options,
            base_url,
            auth,
            http,
        })
    }

    fn auth(id: &ProviderId, options: &LlmOptions, credentials: &CredentialSource) -> ProviderResult<VertexAuth> {
        if let Some(json) = credentials.load()? {
            let credentials = ServiceAccountCredentials::from_json(json.expose_secret())?;
            // Token exchange gets its own client under the same trust policy
            let policy = TrustPolicy::from_env(ProviderId::VERTEX, options.provider_options.as_ref())?;
            let client = SecureClientBuilder::new().trust_policy(policy).build()?;
            let provider = ServiceAccountTokenProvider::new(id.clone(), credentials, client)?;
            debug!(client_email = provider.client_email(), "Using service account credentials");
            return Ok(VertexAuth::ServiceAccount(provider));
        }

        if !options.api_key.is_empty() {
            return Ok(VertexAuth::ApiKey(options.api_key.clone()));
        }

        Err(ProviderError::configuration(
            id.clone(),
            "service account credentials or an api key are required",
        ))
    }

    /// Regional `generateContent` URL for `model`
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url,
            self.options.project_id,
            self.options.region,
            vertex_model_name(model)
        )
    }

    async fn generate(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        log_request(&resolved, system_prompt, user_prompt);
        let token = self.auth.bearer_token().await?;
        let authorization = format!("Bearer {}", token.expose_secret());

        let body = generate_content_body(&resolved, system_prompt, user_prompt);
        let response = self
            .http
            .post_json(
                &self.endpoint(&resolved.model),
                &[("Authorization", authorization.as_str())],
                &body,
                &RequestOptions::new(),
            )
            .await?;
        candidate_text(&response)
    }
}

#[async_trait]
impl LlmProvider for VertexProvider {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> LlmOptions {
        LlmOptions::new().with_project_id("proj").with_api_key("token")
    }

    #[test]
    fn test_model_mapping() {
        assert_eq!(vertex_model_name("gemini-1.5-pro"), GEMINI_2_5_PRO);
        assert_eq!(vertex_model_name("pro"), GEMINI_2_5_PRO);
        assert_eq!(vertex_model_name("gemini-2.5-flash-lite"), GEMINI_2_5_FLASH);
        assert_eq!(vertex_model_name(""), GEMINI_2_5_FLASH);
    }

    #[test]
    fn test_project_id_is_required() {
        let err = VertexProvider::new(LlmOptions::new().with_api_key("token")).unwrap_err();
        match err {
            ProviderError::Configuration { message, .. } => assert_eq!(message, "project id is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_shape() {
        let provider = VertexProvider::new(options().with_region("europe-west4")).unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.5-pro"),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj/locations/europe-west4/publishers/google/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_inline_credentials_must_be_valid_json() {
        let err = VertexProvider::new(
            LlmOptions::new()
                .with_project_id("proj")
                .with_provider_option("credentials_json", "not json"),
        )
        .unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_missing_credentials_file_fails_construction() {
        let err = VertexProvider::new(
            options().with_provider_option("credentials_file", "/nonexistent/polyllm/sa.json"),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
