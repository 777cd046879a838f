//! tls - certificate loading for the HTTPS listener

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from PEM certificate chain and private key files.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
    let cert_file = File::open(cert_path)
        .context(format!("Failed to open TLS certificate {:?}", cert_path))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to parse TLS certificate chain")?;
    if certs.is_empty() {
        anyhow::bail!("no certificates found in {:?}", cert_path);
    }

    let key_file =
        File::open(key_path).context(format!("Failed to open TLS key {:?}", key_path))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .context("Failed to parse TLS private key")?
        .context(format!("no private key found in {:?}", key_path))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("Failed to build TLS server configuration")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
