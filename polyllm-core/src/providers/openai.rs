//! OpenAI provider implementation
//!
//! Chat completions, image generation (base64 payloads) and embeddings over
//! the OpenAI REST API.

use crate::options::{LlmOptions, OutputFormat};
use crate::providers::adapter::{
    base_url, call_span, log_request, provider_id_or, require_api_key, resolve_call,
    resolve_image_call, vendor_http, LlmProvider,
};
use crate::providers::openai_compat::OpenAiCompatible;
use crate::providers::{ProviderId, ProviderResult};
use async_trait::async_trait;
use tracing::{debug, Instrument};

/// OpenAI provider
#[derive(Debug)]
pub struct OpenAiProvider {
    id: ProviderId,
    options: LlmOptions,
    embedding_model: String,
    api: OpenAiCompatible,
}

impl OpenAiProvider {
    pub const DEFAULT_MODEL: &'static str = "gpt-4-turbo-preview";
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "text-embedding-ada-002";
    pub const DEFAULT_IMAGE_SIZE: &'static str = "1024x1024";
    pub const BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Create a new OpenAI provider
    ///
    /// Requires an API key. Trust inputs use the `openai` prefix.
    pub fn new(options: LlmOptions) -> ProviderResult<Self> {
        let id = provider_id_or(&options, ProviderId::OPENAI);
        require_api_key(&id, &options)?;

        let http = vendor_http(&id, ProviderId::OPENAI, &options)?;
        let api = OpenAiCompatible::new(http, base_url(&options, Self::BASE_URL));

        // Embeddings fall back to ada only when no model was configured at all
        let embedding_model = match options.provider_option_str(EMBEDDING_MODEL_OPTION) {
            Some(model) => model.to_string(),
            None if options.model.is_empty() => Self::DEFAULT_EMBEDDING_MODEL.to_string(),
            None => options.model.clone(),
        };

        let mut options = options;
        if options.model.is_empty() {
            options.model = Self::DEFAULT_MODEL.to_string();
        }

        debug!(provider = %id, base_url = api.base_url(), "Created OpenAI provider");
        Ok(Self {
            id,
            options,
            embedding_model,
            api,
        })
    }

    async fn chat(&self, resolved: LlmOptions, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        log_request(&resolved, system_prompt, user_prompt);
        self.api
            .chat(resolved.api_key.expose_secret(), &resolved, system_prompt, user_prompt)
            .await
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

/// Extension key naming the embeddings model
pub const EMBEDDING_MODEL_OPTION: &str = "embedding_model";

/// Extension key naming the image model, the chat model when unset
pub const IMAGE_MODEL_OPTION: &str = "image_model";

/// Extension key naming the generated image size
pub const IMAGE_SIZE_OPTION: &str = "image_size";

#[async_trait]
impl LlmProvider for OpenAiProvider {
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

    async fn generate_image(&self, prompt: &str, overrides: &LlmOptions) -> ProviderResult<Vec<u8>> {
        let resolved = resolve_image_call(&self.options, overrides);
        let span = call_span(&self.id, "generate_image", &resolved);
        let size = resolved
            .provider_option_str(IMAGE_SIZE_OPTION)
            .unwrap_or(Self::DEFAULT_IMAGE_SIZE)
            .to_string();
        let model = resolved
            .provider_option_str(IMAGE_MODEL_OPTION)
            .unwrap_or(&resolved.model)
            .to_string();
        async {
            log_request(&resolved, "", prompt);
            self.api
                .image(resolved.api_key.expose_secret(), &model, prompt, &size)
                .await
        }
        .instrument(span)
        .await
    }

    async fn generate_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let span = call_span(&self.id, "generate_embedding", &self.options);
        self.api
            .embedding(self.options.api_key.expose_secret(), self.embedding_model(), text)
            .instrument(span)
            .await
    }
}
