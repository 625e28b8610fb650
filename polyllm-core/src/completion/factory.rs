//! Constructors for completion models

use super::{CompletionModel, CompletionResponse, MockModel, ProviderModel};
use crate::options::{merge_options, LlmOptions, OutputFormat};
use crate::providers::{ProviderError, ProviderId, ProviderResult, VertexProvider};
use crate::registry::{default_registry, ProviderRegistry};
use crate::tokens::count_tokens;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_MAX_TOKENS: u32 = 4096;
const VERTEX_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Build a completion model from the process-wide registry
pub fn new_model(options: LlmOptions) -> ProviderResult<Arc<dyn CompletionModel>> {
    new_model_with(default_registry(), options)
}

/// Build a completion model for `options.provider` from `registry`
///
/// The provider must be named. `mock` yields a [`MockModel`] answering with
/// `options.mock_response`, or with its default response when that is empty.
/// Any other identifier is constructed through the registry.
pub fn new_model_with(
    registry: &ProviderRegistry,
    options: LlmOptions,
) -> ProviderResult<Arc<dyn CompletionModel>> {
    let id = options
        .provider
        .clone()
        .filter(|id| !id.as_str().is_empty())
        .ok_or(ProviderError::MissingProvider)?;

    if id.as_str() == ProviderId::MOCK {
        let mut model = MockModel::new();
        if !options.mock_response.is_empty() {
            let tokens = count_tokens(&options.mock_response);
            model = model.with_response(CompletionResponse::new(options.mock_response.clone(), tokens));
        }
        return Ok(Arc::new(model.with_options(options)));
    }

    let provider = registry.construct(id, options)?;
    Ok(Arc::new(ProviderModel::new(provider)))
}

/// Text model for `provider` with the standard defaults
///
/// `credentials` carries the API key (or project id for Vertex AI) and may
/// override any default.
pub fn text_model(provider: impl Into<ProviderId>, credentials: LlmOptions) -> ProviderResult<Arc<dyn CompletionModel>> {
    format_model(provider.into(), credentials, OutputFormat::Text)
}

/// JSON model for `provider` with the standard defaults
pub fn json_model(provider: impl Into<ProviderId>, credentials: LlmOptions) -> ProviderResult<Arc<dyn CompletionModel>> {
    format_model(provider.into(), credentials, OutputFormat::Json)
}

/// PNG image model for `provider` with the standard defaults
pub fn image_model(provider: impl Into<ProviderId>, credentials: LlmOptions) -> ProviderResult<Arc<dyn CompletionModel>> {
    format_model(provider.into(), credentials, OutputFormat::ImagePng)
}

fn format_model(
    id: ProviderId,
    credentials: LlmOptions,
    format: OutputFormat,
) -> ProviderResult<Arc<dyn CompletionModel>> {
    let defaults = match id.as_str() {
        ProviderId::OPENAI | ProviderId::GEMINI | ProviderId::ANTHROPIC => {
            if credentials.api_key.is_empty() {
                return Err(ProviderError::configuration(id.clone(), "api key is required"));
            }
            LlmOptions::new()
                .with_max_tokens(DEFAULT_MAX_TOKENS)
                .with_temperature(DEFAULT_TEMPERATURE)
        }
        ProviderId::VERTEX => {
            if credentials.project_id.is_empty() {
                return Err(ProviderError::configuration(id.clone(), "project id is required"));
            }
            LlmOptions::new()
                .with_region(VertexProvider::DEFAULT_REGION)
                .with_max_tokens(VERTEX_MAX_TOKENS)
                .with_temperature(DEFAULT_TEMPERATURE)
        }
        ProviderId::MOCK => LlmOptions::new(),
        _ => return Err(ProviderError::configuration(id.clone(), "unsupported provider")),
    };

    let mut options = merge_options(&defaults, &credentials);
    options.provider = Some(id);
    options.output_format = Some(format);
    debug!(provider = ?options.provider, format = %format, "Building completion model");
    new_model(options)
}
