//! Transport construction errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a hardened HTTP client
///
/// Every variant is fatal: the builder never falls back to a weaker
/// transport after one of these.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unable to read root CA file '{}': {source}", .path.display())]
    ReadCaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid root CA PEM ({origin}): {message}")]
    InvalidCaPem { origin: String, message: String },

    #[error("invalid SPKI pin: {message}")]
    InvalidPin { message: String },

    #[error("provider option '{key}' must be {expected}")]
    InvalidOption { key: String, expected: &'static str },

    #[error("unable to access credentials file '{}': {source}", .path.display())]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS configuration failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("certificate verifier could not be built: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl TransportError {
    pub(crate) fn invalid_pin(message: impl Into<String>) -> Self {
        TransportError::InvalidPin {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_pem(origin: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::InvalidCaPem {
            origin: origin.into(),
            message: message.into(),
        }
    }
}
