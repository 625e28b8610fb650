//! Provider registry
//!
//! Maps a [`ProviderId`] to the constructor that builds its adapter. The table
//! sits behind a multiple-reader/single-writer lock: lookups run in parallel,
//! a registration excludes everyone else for the duration of one map insert.
//! Constructors are invoked after the lock is released, so a slow constructor
//! never blocks other registrations or lookups.
//!
//! A process-wide instance pre-populated with the built-in providers is
//! available through [`default_registry`]. Tests and applications that need
//! isolation should build their own [`ProviderRegistry`].

mod builtins;

pub use builtins::register_builtins;

use crate::options::LlmOptions;
use crate::providers::{LlmProvider, ProviderError, ProviderId, ProviderResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Constructor building an adapter from its base options
pub type ProviderFactory =
    Arc<dyn Fn(LlmOptions) -> ProviderResult<Arc<dyn LlmProvider>> + Send + Sync>;

static DEFAULT_REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::with_builtins);

/// Shared registry holding the built-in providers
pub fn default_registry() -> &'static ProviderRegistry {
    &DEFAULT_REGISTRY
}

/// Concurrent table of provider constructors
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<ProviderId, ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in provider registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        register_builtins(&registry);
        registry
    }

    /// Store `factory` under `id`, replacing any previous constructor
    pub fn register<F>(&self, id: impl Into<ProviderId>, factory: F)
    where
        F: Fn(LlmOptions) -> ProviderResult<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        let id = id.into();
        let factory: ProviderFactory = Arc::new(factory);
        let previous = self.factories.write().insert(id.clone(), factory);
        if previous.is_some() {
            debug!(provider = %id, "Replaced registered provider constructor");
        } else {
            debug!(provider = %id, "Registered provider constructor");
        }
    }

    /// Register a provider under a caller-chosen name
    pub fn register_custom<F>(&self, name: &str, factory: F)
    where
        F: Fn(LlmOptions) -> ProviderResult<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.register(ProviderId::new(name), factory);
    }

    /// Constructor registered under `id`, if any
    pub fn lookup(&self, id: &str) -> Option<ProviderFactory> {
        self.factories.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.read().contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.factories.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// Build the adapter registered under `id`
    ///
    /// `options.provider` is set to `id` before the constructor runs. A
    /// constructor failure is returned as is.
    pub fn construct(
        &self,
        id: impl Into<ProviderId>,
        mut options: LlmOptions,
    ) -> ProviderResult<Arc<dyn LlmProvider>> {
        let id = id.into();
        let factory = self
            .lookup(id.as_str())
            .ok_or_else(|| ProviderError::NotRegistered {
                provider: id.clone(),
            })?;

        debug!(provider = %id, model = %options.model, "Constructing provider");
        options.provider = Some(id);
        factory(options)
    }

    /// Build the adapter named by `options.provider`, defaulting to OpenAI
    pub fn new_llm(&self, options: LlmOptions) -> ProviderResult<Arc<dyn LlmProvider>> {
        let id = options
            .provider
            .clone()
            .filter(|id| !id.as_str().is_empty())
            .unwrap_or_else(|| ProviderId::new(ProviderId::OPENAI));
        self.construct(id, options)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
