//! Vertex AI authentication
//!
//! Service-account credentials are exchanged for an OAuth access token with
//! the JWT bearer grant. Tokens are cached and refreshed five minutes before
//! they expire. The cache lock is held across a refresh so concurrent callers
//! wait for one exchange instead of each starting their own.

use crate::config::SecretString;
use crate::http::error::{map_send_error, map_status_error};
use crate::providers::{ProviderError, ProviderId, ProviderResult};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Google OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope granting Vertex AI access
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_SAFETY_WINDOW_SECS: i64 = 300;

/// Fields of a service-account key file used for the JWT grant
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: SecretString,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountCredentials {
    /// Parse a service-account JSON document
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(ProviderId::VERTEX, format!("invalid service account JSON: {e}"))
        })
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Clone)]
struct CachedToken {
    token: SecretString,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_SAFETY_WINDOW_SECS > now
    }
}

/// Access-token source backed by a service account
pub struct ServiceAccountTokenProvider {
    provider: ProviderId,
    credentials: ServiceAccountCredentials,
    key: EncodingKey,
    client: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    /// Create a token provider; the private key is parsed here
    pub fn new(provider: ProviderId, credentials: ServiceAccountCredentials, client: Client) -> ProviderResult<Self> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.expose_secret().as_bytes())
            .map_err(|e| {
                ProviderError::configuration(
                    provider.clone(),
                    format!("invalid service account private key: {e}"),
                )
            })?;

        Ok(Self {
            provider,
            credentials,
            key,
            client,
            cache: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Current access token, exchanging a new one when needed
    pub async fn access_token(&self) -> ProviderResult<SecretString> {
        let mut cache = self.cache.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(cached) = cache.as_ref().filter(|cached| cached.is_fresh(now)) {
            return Ok(cached.token.clone());
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    fn assertion(&self, now: i64) -> ProviderResult<String> {
        let claims = Claims {
            iss: &self.credentials.client_email,
            scope: DEFAULT_SCOPE,
            aud: self.credentials.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());

        encode(&header, &claims, &self.key).map_err(|e| {
            ProviderError::configuration(self.provider.clone(), format!("failed to sign JWT: {e}"))
        })
    }

    async fn exchange(&self, now: i64) -> ProviderResult<CachedToken> {
        let request_id = Uuid::new_v4();
        let token_uri = self.credentials.token_uri();
        info!(
            "Exchanging service account assertion for {} [request_id: {}]",
            self.provider, request_id
        );

        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(token_uri)
            .header("X-Request-ID", request_id.to_string())
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| map_send_error(&self.provider, e, request_id))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(&self.provider, status, &body));
        }

        let token: TokenResponse = response.json().await?;
        debug!(
            expires_in = token.expires_in,
            "Obtained access token [request_id: {}]", request_id
        );

        Ok(CachedToken {
            token: SecretString::new(token.access_token),
            expires_at: now + token.expires_in,
        })
    }
}

impl fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("client_email", &self.credentials.client_email)
            .field("token_uri", &self.credentials.token_uri())
            .finish()
    }
}

/// How Vertex requests are authorized
#[derive(Debug)]
pub enum VertexAuth {
    /// Static bearer token from the configured API key
    ApiKey(SecretString),
    /// Exchanged service-account token
    ServiceAccount(ServiceAccountTokenProvider),
}

impl VertexAuth {
    /// Bearer token for the next request
    pub async fn bearer_token(&self) -> ProviderResult<SecretString> {
        match self {
            VertexAuth::ApiKey(key) => Ok(key.clone()),
            VertexAuth::ServiceAccount(provider) => provider.access_token().await,
        }
    }
}
