//! Secure transport construction
//!
//! Builds the HTTP client vendor adapters talk through. The client always
//! verifies server certificates against the platform roots plus any custom
//! CA bundle, negotiates TLS 1.2 or newer, and optionally pins the leaf
//! certificate's SubjectPublicKeyInfo. Any failure while building is fatal:
//! there is no silent fallback to a weaker client. A client built with a
//! custom CA or a pin refuses plain `http://` URLs.
//!
//! ```no_run
//! use polyllm_core::transport::{SecureClientBuilder, TrustPolicy};
//!
//! let policy = TrustPolicy::new().with_spki_pin("sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=");
//! let client = SecureClientBuilder::new().trust_policy(policy).build()?;
//! # Ok::<(), polyllm_core::transport::TransportError>(())
//! ```

mod credentials;
mod error;
mod pinning;
mod policy;
mod roots;

pub use credentials::{
    CredentialSource, APPLICATION_CREDENTIALS_ENV, CREDENTIALS_FILE_ENV, CREDENTIALS_FILE_OPTION,
    CREDENTIALS_JSON_ENV, CREDENTIALS_JSON_OPTION,
};
pub use error::TransportError;
pub use pinning::{spki_sha256_pin, SpkiPin};
pub use policy::{process_env, EnvLookup, TrustPolicy};

use pinning::PinnedServerVerifier;
use reqwest::Client;
use rustls::client::WebPkiServerVerifier;
use rustls::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Bound on TCP connect plus TLS handshake
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on a whole request including reading the body
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = concat!("polyllm/", env!("CARGO_PKG_VERSION"));

const POOL_MAX_IDLE_PER_HOST: usize = 10;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Builder for the hardened HTTP client
#[derive(Debug, Clone)]
pub struct SecureClientBuilder {
    policy: TrustPolicy,
    handshake_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for SecureClientBuilder {
    fn default() -> Self {
        Self {
            policy: TrustPolicy::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SecureClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Build the rustls configuration for the current policy
    pub fn build_tls_config(&self) -> Result<ClientConfig, TransportError> {
        build_tls_config(&self.policy)
    }

    /// Build the HTTP client
    pub fn build(&self) -> Result<Client, TransportError> {
        let tls = self.build_tls_config()?;

        let client = Client::builder()
            .use_preconfigured_tls(tls)
            .https_only(self.policy.is_hardened())
            .connect_timeout(self.handshake_timeout)
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .user_agent(self.user_agent.as_str())
            .build()?;

        info!(
            custom_roots = self.policy.has_custom_roots(),
            pinned = self.policy.spki_pin.is_some(),
            "Built secure HTTP client"
        );
        Ok(client)
    }
}

/// rustls configuration for `policy`
///
/// TLS 1.2 and 1.3 only. With a pin set, certificates are first verified
/// against the roots and then checked against the pin.
pub fn build_tls_config(policy: &TrustPolicy) -> Result<ClientConfig, TransportError> {
    let pin = policy.spki_pin.as_deref().map(SpkiPin::parse).transpose()?;
    let roots = Arc::new(roots::build_root_store(policy)?);
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?;

    let mut config = match pin {
        Some(pin) => {
            debug!(pin = ?pin, "Enabling SPKI pinning");
            let inner = WebPkiServerVerifier::builder_with_provider(roots, provider).build()?;
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(PinnedServerVerifier::new(inner, pin)))
                .with_no_client_auth()
        }
        None => builder.with_root_certificates(roots).with_no_client_auth(),
    };
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Hardened client for `policy` with default timeouts
pub fn build_secure_client(policy: &TrustPolicy) -> Result<Client, TransportError> {
    SecureClientBuilder::new().trust_policy(policy.clone()).build()
}
