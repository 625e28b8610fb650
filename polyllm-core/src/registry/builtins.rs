//! Built-in provider constructors

use super::ProviderRegistry;
use crate::options::LlmOptions;
use crate::providers::{
    AnthropicProvider, CustomProvider, GeminiProvider, LlmProvider, MockProvider, OpenAiProvider,
    OpenRouterProvider, ProviderId, ProviderResult, VertexProvider,
};
use std::sync::Arc;

/// Register every built-in provider in `registry`
///
/// Existing entries under the built-in identifiers are replaced.
pub fn register_builtins(registry: &ProviderRegistry) {
    registry.register(ProviderId::OPENAI, |options| shared(OpenAiProvider::new(options)));
    registry.register(ProviderId::GEMINI, |options| shared(GeminiProvider::new(options)));
    registry.register(ProviderId::VERTEX, |options| shared(VertexProvider::new(options)));
    registry.register(ProviderId::ANTHROPIC, |options| {
        shared(AnthropicProvider::new(options))
    });
    registry.register(ProviderId::CUSTOM, |options| shared(CustomProvider::new(options)));
    registry.register(ProviderId::OPENROUTER, |options| {
        shared(OpenRouterProvider::new(options))
    });
    registry.register(ProviderId::MOCK, |options: LlmOptions| {
        Ok(Arc::new(MockProvider::new(options)) as Arc<dyn LlmProvider>)
    });
}

fn shared<P: LlmProvider + 'static>(provider: ProviderResult<P>) -> ProviderResult<Arc<dyn LlmProvider>> {
    provider.map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
}
