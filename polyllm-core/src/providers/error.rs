//! Provider error types and handling

use crate::providers::ProviderId;
use crate::transport::TransportError;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while constructing or calling a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required option is missing or invalid at construction
    #[error("{provider}: configuration error: {message}")]
    Configuration {
        provider: ProviderId,
        message: String,
    },

    /// No provider was named
    #[error("provider is required")]
    MissingProvider,

    /// No constructor registered under the identifier
    #[error("provider not registered: {provider}")]
    NotRegistered { provider: ProviderId },

    /// The hardened transport could not be built
    #[error("transport construction failed: {0}")]
    Transport(#[from] TransportError),

    /// The vendor answered with a non-success status
    ///
    /// The body is kept verbatim (truncated) and never interpreted.
    #[error("{provider} returned HTTP {status}: {body}")]
    Vendor {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout occurred
    #[error("Request timed out")]
    Timeout,

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Response body exceeded the size cap
    #[error("Response size exceeds maximum of {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// The request carried nothing to send
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not offered by the provider
    #[error("{operation} not supported by {provider}")]
    Unsupported {
        provider: ProviderId,
        operation: &'static str,
    },
}

impl ProviderError {
    pub fn configuration(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        ProviderError::Configuration {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(provider: impl Into<ProviderId>, operation: &'static str) -> Self {
        ProviderError::Unsupported {
            provider: provider.into(),
            operation,
        }
    }

    /// Whether the error was raised before any vendor call was attempted
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Configuration { .. }
                | ProviderError::MissingProvider
                | ProviderError::NotRegistered { .. }
                | ProviderError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
