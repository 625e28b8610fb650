//! Integration tests for the hardened transport against a local TLS server
//!
//! A throwaway CA signs a leaf for `localhost`/`127.0.0.1`; the server speaks
//! just enough HTTP/1.1 to answer one request per connection.

use polyllm_core::providers::CustomProvider;
use polyllm_core::transport::{build_secure_client, spki_sha256_pin, TransportError};
use polyllm_core::{LlmOptions, LlmProvider, ProviderError, SecureClientBuilder, TrustPolicy};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestPki {
    ca_pem: String,
    leaf_der: CertificateDer<'static>,
    leaf_key: PrivateKeyDer<'static>,
}

fn test_pki() -> TestPki {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "polyllm test CA");
    ca_params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let mut leaf_params =
        CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
    leaf_params
        .distinguished_name
        .push(DnType::CommonName, "localhost");
    leaf_params.is_ca = IsCa::NoCa;
    leaf_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    let leaf_cert = leaf_params.signed_by(&leaf_key, &ca_cert, &ca_key).unwrap();

    TestPki {
        ca_pem: ca_cert.pem(),
        leaf_der: leaf_cert.der().clone(),
        leaf_key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
    }
}

fn tls_acceptor(pki: &TestPki) -> TlsAcceptor {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![pki.leaf_der.clone()], pki.leaf_key.clone_key())
        .unwrap();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    TlsAcceptor::from(Arc::new(config))
}

/// Serve `body` over TLS until the test ends
async fn spawn_tls_server(pki: &TestPki, body: &'static str) -> SocketAddr {
    let acceptor = tls_acceptor(pki);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Handshake failures are the point of some tests
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                if read_request(&mut tls).await.is_err() {
                    return;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = tls.write_all(response.as_bytes()).await;
                let _ = tls.shutdown().await;
            });
        }
    });

    addr
}

/// Complete the handshake and read the request, then never answer
async fn spawn_stalled_tls_server(pki: &TestPki) -> SocketAddr {
    let acceptor = tls_acceptor(pki);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let _ = read_request(&mut tls).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(tls);
            });
        }
    });

    addr
}

/// Read one request: headers, then `Content-Length` bytes of body
async fn read_request<S: AsyncReadExt + Unpin>(stream: &mut S) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() - header_end < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(())
}

fn other_pin() -> String {
    use base64::Engine;
    format!(
        "sha256/{}",
        base64::engine::general_purpose::STANDARD.encode([7u8; 32])
    )
}

#[tokio::test]
async fn test_custom_root_ca_is_trusted() {
    let pki = test_pki();
    let addr = spawn_tls_server(&pki, "ok").await;

    let client = build_secure_client(&TrustPolicy::new().with_root_ca_pem(pki.ca_pem.clone())).unwrap();
    let response = client
        .get(format!("https://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_unknown_ca_is_rejected() {
    let pki = test_pki();
    let addr = spawn_tls_server(&pki, "ok").await;

    let client = build_secure_client(&TrustPolicy::new()).unwrap();
    let result = client
        .get(format!("https://localhost:{}/", addr.port()))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_matching_pin_connects() {
    let pki = test_pki();
    let addr = spawn_tls_server(&pki, "pinned").await;
    let pin = spki_sha256_pin(&pki.leaf_der).unwrap();

    let policy = TrustPolicy::new()
        .with_root_ca_pem(pki.ca_pem.clone())
        .with_spki_pin(format!("sha256/{pin}"));
    let client = build_secure_client(&policy).unwrap();
    let response = client
        .get(format!("https://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "pinned");
}

#[tokio::test]
async fn test_mismatched_pin_aborts_handshake() {
    let pki = test_pki();
    let addr = spawn_tls_server(&pki, "never").await;

    let policy = TrustPolicy::new()
        .with_root_ca_pem(pki.ca_pem.clone())
        .with_spki_pin(other_pin());
    let client = build_secure_client(&policy).unwrap();
    let err = client
        .get(format!("https://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_connect() || err.is_request(), "{err:?}");
}

#[test]
fn test_malformed_pin_fails_construction() {
    let policy = TrustPolicy::new().with_spki_pin("sha256/short");
    assert!(matches!(
        build_secure_client(&policy),
        Err(TransportError::InvalidPin { .. })
    ));
}

/// Trust inputs supplied as provider options reach the adapter's transport
#[tokio::test]
async fn test_adapter_uses_pinned_transport() {
    let pki = test_pki();
    let addr = spawn_tls_server(&pki, "adapter over pinned tls").await;
    let pin = spki_sha256_pin(&pki.leaf_der).unwrap();
    let url = format!("https://127.0.0.1:{}/generate", addr.port());

    let provider = CustomProvider::new(
        LlmOptions::new()
            .with_provider_option("url", url.clone())
            .with_provider_option("custom_root_ca_pem", pki.ca_pem.clone())
            .with_provider_option("custom_spki_hash", pin),
    )
    .unwrap();
    let answer = provider.generate_text("", "hi", &LlmOptions::new()).await.unwrap();
    assert_eq!(answer, "adapter over pinned tls");

    let mismatched = CustomProvider::new(
        LlmOptions::new()
            .with_provider_option("url", url)
            .with_provider_option("custom_root_ca_pem", pki.ca_pem.clone())
            .with_provider_option("custom_spki_hash", other_pin()),
    )
    .unwrap();
    let err = mismatched
        .generate_text("", "hi", &LlmOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)), "{err:?}");
}

#[test]
fn test_adapter_rejects_malformed_pin_option() {
    let err = CustomProvider::new(
        LlmOptions::new()
            .with_provider_option("url", "https://127.0.0.1:1/")
            .with_provider_option("custom_spki_hash", "!!!"),
    )
    .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(TransportError::InvalidPin { .. })));
}

#[tokio::test]
async fn test_hardened_client_refuses_plain_http() {
    let pki = test_pki();
    let client = build_secure_client(&TrustPolicy::new().with_root_ca_pem(pki.ca_pem)).unwrap();
    let err = client.get("http://127.0.0.1:1/").send().await.unwrap_err();
    assert!(err.is_builder(), "{err:?}");

    // Without hardening plain http stays usable
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let plain = build_secure_client(&TrustPolicy::new()).unwrap();
    assert_eq!(plain.get(server.uri()).send().await.unwrap().status(), 200);
}

/// A pinned adapter pointed at an http endpoint fails without sending anything
#[tokio::test]
async fn test_pinned_adapter_never_sends_plaintext() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plaintext reply"))
        .expect(0)
        .mount(&server)
        .await;

    let provider = CustomProvider::new(
        LlmOptions::new()
            .with_provider_option("url", format!("{}/generate", server.uri()))
            .with_provider_option("custom_spki_hash", other_pin()),
    )
    .unwrap();
    let err = provider
        .generate_text("", "hi", &LlmOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn test_silent_server_hits_handshake_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept TCP and keep the sockets open without ever speaking TLS
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let client = SecureClientBuilder::new()
        .handshake_timeout(Duration::from_millis(300))
        .request_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    let started = Instant::now();
    let err = client
        .get(format!("https://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "{err:?}");
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
}

#[tokio::test]
async fn test_unanswered_request_hits_request_timeout() {
    let pki = test_pki();
    let addr = spawn_stalled_tls_server(&pki).await;

    let client = SecureClientBuilder::new()
        .trust_policy(TrustPolicy::new().with_root_ca_pem(pki.ca_pem.clone()))
        .handshake_timeout(Duration::from_secs(10))
        .request_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let started = Instant::now();
    let err = client
        .get(format!("https://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}
