//! Polyllm Core Library
//!
//! One interface over several LLM backends. The crate provides:
//!
//! - [`registry`]: a process-wide table mapping provider identifiers to
//!   adapter constructors, with the built-in vendors pre-registered.
//! - [`options`]: the layered call configuration and the resolver that merges
//!   a per-call override onto an adapter's base configuration.
//! - [`transport`]: the hardened HTTPS client builder (custom root CA and
//!   SPKI pinning) every vendor adapter sends through.
//! - [`providers`]: the [`LlmProvider`] contract and the built-in adapters.
//! - [`completion`]: single-call models bound to one output format, with a
//!   mock that can echo prompts or fail on demand.
//! - [`config`]: named provider profiles loaded from YAML or JSON.
//!
//! ```no_run
//! use polyllm_core::{LlmOptions, ProviderRegistry};
//!
//! # async fn run() -> Result<(), polyllm_core::ProviderError> {
//! let registry = ProviderRegistry::with_builtins();
//! let llm = registry.construct("openai", LlmOptions::new().with_api_key("sk-..."))?;
//! let answer = llm
//!     .generate_text("You are terse.", "Name a prime.", &LlmOptions::new().with_max_tokens(8))
//!     .await?;
//! # let _ = answer;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod http;
pub mod options;
pub mod providers;
pub mod registry;
pub mod tokens;
pub mod transport;

pub use completion::{CompletionModel, CompletionRequest, CompletionResponse, MockModel};
pub use options::{merge_options, LlmOptions, OutputFormat, ProviderOptions};
pub use providers::{LlmProvider, ProviderError, ProviderId, ProviderResult};
pub use registry::{default_registry, ProviderRegistry};
pub use transport::{SecureClientBuilder, TransportError, TrustPolicy};

/// Returns the version of the Polyllm Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
