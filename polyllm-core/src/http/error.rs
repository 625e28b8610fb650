//! HTTP error mapping utilities

use crate::providers::{ProviderError, ProviderId};
use reqwest::StatusCode;
use tracing::{error, warn};
use uuid::Uuid;

/// Longest vendor error body kept in a [`ProviderError::Vendor`]
pub const MAX_ERROR_BODY: usize = 2048;

/// Map a non-success status to a vendor error
///
/// The body is carried as is, truncated to [`MAX_ERROR_BODY`] bytes on a
/// character boundary. It is never parsed.
pub fn map_status_error(provider: &ProviderId, status: StatusCode, body: &str) -> ProviderError {
    ProviderError::Vendor {
        provider: provider.clone(),
        status: status.as_u16(),
        body: truncate_body(body),
    }
}

/// Map a send failure, logging it with the request ID
pub fn map_send_error(provider: &ProviderId, err: reqwest::Error, request_id: Uuid) -> ProviderError {
    if err.is_timeout() {
        warn!("Request timeout for {} [request_id: {}]", provider, request_id);
    } else {
        error!("Request error for {} [request_id: {}]: {}", provider, request_id, err);
    }
    ProviderError::from(err)
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
