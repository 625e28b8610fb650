//! HTTP layer shared by the vendor adapters
//!
//! This module handles:
//! - JSON POST requests over a client built by [`crate::transport`]
//! - Request ID generation and correlation
//! - Response size limits
//! - Mapping transport failures and non-success statuses to [`ProviderError`](crate::providers::ProviderError)

pub mod client;
pub mod error;

pub use client::{VendorHttp, VendorResponse, MAX_RESPONSE_SIZE};

use std::time::Duration;
use uuid::Uuid;

/// Options for one vendor request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Per-request timeout overriding the client's
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Create request options with a fresh request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a caller-supplied request ID
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}
