//! Provider abstraction and built-in adapters
//!
//! Every backend implements [`LlmProvider`]. Adapters are normally obtained
//! from the [`ProviderRegistry`](crate::registry::ProviderRegistry), but each
//! one can also be constructed directly from an [`LlmOptions`](crate::options::LlmOptions).

pub mod adapter;
pub mod anthropic;
pub mod custom;
pub mod error;
pub mod gemini;
pub mod id;
pub mod mock;
pub mod openai;
mod openai_compat;
pub mod openrouter;
pub mod vertex;

pub use adapter::LlmProvider;
pub use error::{ProviderError, ProviderResult};
pub use id::ProviderId;

// Re-export concrete providers
pub use anthropic::AnthropicProvider;
pub use custom::CustomProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;
pub use vertex::VertexProvider;
