//! Provider identifiers

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque registry key naming a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub const OPENAI: &'static str = "openai";
    pub const GEMINI: &'static str = "gemini";
    pub const VERTEX: &'static str = "vertex";
    pub const MOCK: &'static str = "mock";
    pub const ANTHROPIC: &'static str = "anthropic";
    pub const CUSTOM: &'static str = "custom";
    pub const OPENROUTER: &'static str = "openrouter";

    /// Identifiers registered by [`ProviderRegistry::with_builtins`](crate::registry::ProviderRegistry::with_builtins)
    pub const BUILTIN: [&'static str; 7] = [
        Self::OPENAI,
        Self::GEMINI,
        Self::VERTEX,
        Self::MOCK,
        Self::ANTHROPIC,
        Self::CUSTOM,
        Self::OPENROUTER,
    ];

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_builtin(&self) -> bool {
        Self::BUILTIN.contains(&self.0.as_str())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ProviderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
