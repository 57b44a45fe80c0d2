// TLS material loading for the development server
// Missing files are fatal: the server refuses to start without them.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::ms_error::TlsError;
use crate::ms_settings::TlsFiles;

/// Builds a rustls server configuration from the PEM key and certificate
/// files named in the dev server settings.
pub fn load_server_config(files: &TlsFiles) -> Result<rustls::ServerConfig, TlsError> {
    let key_pem = read_file("key", &files.key)?;
    let cert_pem = read_file("certificate", &files.cert)?;

    let mut reader = &cert_pem[..];
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<CertificateDer<'static>>, _>>()
        .map_err(|source| TlsError::Read {
            what: "certificate",
            path: files.cert.display().to_string(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::EmptyChain(files.cert.display().to_string()));
    }

    let key = parse_private_key(&key_pem, &files.key)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    log::debug!(
        "loaded TLS material (key='{}', cert='{}')",
        files.key.display(),
        files.cert.display()
    );
    Ok(config)
}

fn read_file(what: &'static str, path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::Read {
        what,
        path: path.display().to_string(),
        source,
    })
}

fn parse_private_key(pem: &[u8], path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = pem;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            what: "key",
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.display().to_string()))
}
