//! config - resolved server configuration
//!
//! The binary resolves flags and environment once at startup and injects the
//! result; the library itself never reads the environment.

use crate::store;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listening port; the HTTPS listener, when enabled, uses the next
    /// port up.
    pub port: u16,
    /// Backing file for the command store.
    pub data_path: PathBuf,
    /// PEM certificate chain for the HTTPS listener.
    pub tls_cert: Option<PathBuf>,
    /// PEM private key for the HTTPS listener.
    pub tls_key: Option<PathBuf>,
}

impl ServerConfig {
    /// True when both TLS paths are configured.
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }

    pub fn https_port(&self) -> u16 {
        self.port.saturating_add(1)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: store::default_store_path(),
            tls_cert: None,
            tls_key: None,
        }
    }
}
