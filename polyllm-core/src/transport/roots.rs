//! Trust root assembly

use super::error::TransportError;
use super::policy::TrustPolicy;
use rustls::RootCertStore;
use tracing::debug;

/// Build the root store for `policy`
///
/// The bundled Mozilla roots are always present; custom CAs are added on top
/// of them, never in place of them.
pub(crate) fn build_root_store(policy: &TrustPolicy) -> Result<RootCertStore, TransportError> {
    let mut store = RootCertStore::empty();
    store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(pem) = &policy.root_ca_pem {
        let added = add_pem_certificates(&mut store, pem.as_bytes(), "inline PEM")?;
        debug!(added, "Added inline root CA certificates");
    }

    if let Some(path) = &policy.root_ca_file {
        let bytes = std::fs::read(path).map_err(|source| TransportError::ReadCaFile {
            path: path.clone(),
            source,
        })?;
        let added = add_pem_certificates(&mut store, &bytes, &path.display().to_string())?;
        debug!(added, path = %path.display(), "Added root CA certificates from file");
    }

    Ok(store)
}

/// Parse every certificate in `pem` into `store`
///
/// Input yielding zero certificates is an error.
pub(crate) fn add_pem_certificates(
    store: &mut RootCertStore,
    pem: &[u8],
    origin: &str,
) -> Result<usize, TransportError> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::invalid_pem(origin, e.to_string()))?;

    if certs.is_empty() {
        return Err(TransportError::invalid_pem(origin, "no certificates found"));
    }

    let count = certs.len();
    for cert in certs {
        store
            .add(cert)
            .map_err(|e| TransportError::invalid_pem(origin, e.to_string()))?;
    }
    Ok(count)
}
