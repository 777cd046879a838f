//! net_info - best-effort LAN address discovery
//!
//! Used for the startup banner and the `/network-info` endpoint so a client
//! on another device knows which URL to enter.

use serde::Serialize;
use std::net::{IpAddr, UdpSocket};

/// Addressing details served to the client.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    #[serde(rename = "localIP")]
    pub local_ip: String,
    pub port: u16,
    pub url: Option<String>,
}

/// The primary outbound IPv4 address, if one exists.
///
/// Connecting a UDP socket picks the interface the OS would route through
/// without sending any packet. Loopback-only hosts return None.
pub fn local_lan_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}

/// Assemble the `/network-info` response for the given listening port.
pub fn network_info(port: u16) -> NetworkInfo {
    match local_lan_ip() {
        Some(ip) => NetworkInfo {
            local_ip: ip.to_string(),
            port,
            url: Some(format!("http://{}:{}", ip, port)),
        },
        None => NetworkInfo {
            local_ip: "unavailable".to_string(),
            port,
            url: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_info_shape() {
        let info = network_info(3000);
        assert_eq!(info.port, 3000);
        assert!(!info.local_ip.is_empty());
        if let Some(url) = &info.url {
            assert!(url.starts_with("http://"));
            assert!(url.ends_with(":3000"));
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let info = network_info(8080);
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"localIP\""));
        assert!(json.contains("\"port\":8080"));
    }
}
