//! SubjectPublicKeyInfo pinning
//!
//! A pin is the base64 SHA-256 digest of the DER-encoded SubjectPublicKeyInfo
//! of the server's leaf certificate. Pinning runs after the standard chain
//! and hostname verification and can only narrow what that accepts.

use super::error::TransportError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, SignatureScheme};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

const PIN_PREFIX: &str = "sha256/";
const DIGEST_LEN: usize = 32;

/// Decoded SPKI pin
#[derive(Clone, PartialEq, Eq)]
pub struct SpkiPin([u8; DIGEST_LEN]);

impl SpkiPin {
    /// Parse a base64 pin, with or without the `sha256/` prefix
    pub fn parse(encoded: &str) -> Result<Self, TransportError> {
        let trimmed = encoded.trim();
        let trimmed = trimmed.strip_prefix(PIN_PREFIX).unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(TransportError::invalid_pin("pin is empty"));
        }

        let bytes = STANDARD
            .decode(trimmed)
            .map_err(|e| TransportError::invalid_pin(format!("not valid base64: {e}")))?;

        let digest: [u8; DIGEST_LEN] = bytes.as_slice().try_into().map_err(|_| {
            TransportError::invalid_pin(format!(
                "expected a {DIGEST_LEN}-byte SHA-256 digest, got {} bytes",
                bytes.len()
            ))
        })?;

        Ok(Self(digest))
    }

    /// Pin of a DER-encoded certificate
    pub fn from_certificate(cert_der: &[u8]) -> Result<Self, TransportError> {
        spki_digest(cert_der)
            .map(Self)
            .map_err(|message| TransportError::invalid_pin(format!("unparseable certificate: {message}")))
    }

    /// Constant-time comparison against a computed digest
    pub fn matches(&self, digest: &[u8]) -> bool {
        self.0.as_slice().ct_eq(digest).into()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for SpkiPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpkiPin({PIN_PREFIX}{})", self.to_base64())
    }
}

/// Base64 SPKI pin for a DER-encoded certificate
///
/// Useful for operators computing the value to configure.
pub fn spki_sha256_pin(cert_der: &[u8]) -> Result<String, TransportError> {
    SpkiPin::from_certificate(cert_der).map(|pin| pin.to_base64())
}

fn spki_digest(cert_der: &[u8]) -> Result<[u8; DIGEST_LEN], String> {
    let (_, cert) = x509_parser::parse_x509_certificate(cert_der).map_err(|e| e.to_string())?;
    let digest = Sha256::digest(cert.tbs_certificate.subject_pki.raw);

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// Chain verification followed by a leaf SPKI pin check
///
/// rustls aborts a handshake without peer certificates before the verifier
/// runs, so `end_entity` is always present here.
#[derive(Debug)]
pub(crate) struct PinnedServerVerifier {
    inner: Arc<WebPkiServerVerifier>,
    pin: SpkiPin,
}

impl PinnedServerVerifier {
    pub(crate) fn new(inner: Arc<WebPkiServerVerifier>, pin: SpkiPin) -> Self {
        Self { inner, pin }
    }
}

impl ServerCertVerifier for PinnedServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verified = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        )?;

        let digest = spki_digest(end_entity.as_ref()).map_err(|message| {
            warn!(server = ?server_name, error = %message, "Unable to parse leaf certificate");
            rustls::Error::InvalidCertificate(CertificateError::BadEncoding)
        })?;

        if !self.pin.matches(&digest) {
            warn!(
                server = ?server_name,
                expected = %self.pin.to_base64(),
                presented = %STANDARD.encode(digest),
                "Certificate SPKI pin mismatch"
            );
            return Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ));
        }

        Ok(verified)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
