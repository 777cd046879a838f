// deck_core/tests/http_api_tests.rs
// End-to-end tests over a real listener on an ephemeral port, raw HTTP/1.1.

use deck_core::config::ServerConfig;
use deck_core::server::DeckServer;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Bind a server on port 0 with a temp-dir store and start serving it.
async fn start_server() -> (TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        port: 0,
        data_path: dir.path().join("commands.json"),
        tls_cert: None,
        tls_key: None,
    };

    let server = DeckServer::bind(&config).await.unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });

    (dir, SocketAddr::from(([127, 0, 0, 1], port)))
}

/// Send one raw request and collect the whole response (the server closes
/// the connection after each request).
async fn send(addr: SocketAddr, raw: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

async fn get(addr: SocketAddr, path: &str) -> String {
    send(
        addr,
        format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path),
    )
    .await
}

async fn post(addr: SocketAddr, path: &str, body: &str) -> String {
    send(
        addr,
        format!(
            "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            path,
            body.len(),
            body
        ),
    )
    .await
}

fn status_of(response: &str) -> u16 {
    response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn body_of(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}

#[tokio::test]
async fn test_full_command_lifecycle() {
    let (_dir, addr) = start_server().await;

    // fresh store serves an empty collection
    let response = get(addr, "/command").await;
    assert_eq!(status_of(&response), 200);
    assert_eq!(body_of(&response), "[]");

    // replace the collection with one command
    let saved = post(
        addr,
        "/command",
        r#"[{"id":"a","label":"Greet","type":"command","payload":"echo hola"}]"#,
    )
    .await;
    assert_eq!(status_of(&saved), 200);
    assert_eq!(body_of(&saved), r#"{"success":true}"#);

    // the collection round-trips
    let listed = get(addr, "/command").await;
    assert_eq!(status_of(&listed), 200);
    let commands: serde_json::Value = serde_json::from_str(body_of(&listed)).unwrap();
    assert_eq!(commands.as_array().unwrap().len(), 1);
    assert_eq!(commands[0]["id"], "a");
    assert_eq!(commands[0]["label"], "Greet");

    // executing it spawns the shell and reports captured output
    let executed = post(addr, "/command/execute/a", "").await;
    assert_eq!(status_of(&executed), 200);
    let outcome: serde_json::Value = serde_json::from_str(body_of(&executed)).unwrap();
    assert_eq!(outcome["success"], true);
    assert!(outcome["output"].as_str().unwrap().contains("hola"));
}

#[tokio::test]
async fn test_execute_unknown_id_is_404() {
    let (_dir, addr) = start_server().await;

    let response = post(addr, "/command/execute/missing", "").await;
    assert_eq!(status_of(&response), 404);
    assert!(body_of(&response).contains("Command not found"));
}

#[tokio::test]
async fn test_denylisted_payload_is_403() {
    let (_dir, addr) = start_server().await;

    let saved = post(addr, "/command", r#"[{"id":"x","payload":"rm -rf /"}]"#).await;
    assert_eq!(status_of(&saved), 200);

    let response = post(addr, "/command/execute/x", "").await;
    assert_eq!(status_of(&response), 403);
    assert!(body_of(&response).contains("Command not allowed"));
}

#[tokio::test]
async fn test_invalid_save_body_is_400() {
    let (_dir, addr) = start_server().await;

    let response = post(addr, "/command", "{\"not\":\"an array\"}").await;
    assert_eq!(status_of(&response), 400);
    assert!(body_of(&response).contains("Invalid command collection"));
}

#[tokio::test]
async fn test_multimedia_presets_served_as_pure_data() {
    let (_dir, addr) = start_server().await;

    let response = get(addr, "/command/presets/multimedia").await;
    assert_eq!(status_of(&response), 200);

    let presets: serde_json::Value = serde_json::from_str(body_of(&response)).unwrap();
    let presets = presets.as_array().unwrap();
    assert!(!presets.is_empty());
    assert!(presets[0]["id"].as_str().unwrap().starts_with("preset-"));

    // serving presets twice yields identical data, no side effects
    let again = get(addr, "/command/presets/multimedia").await;
    assert_eq!(body_of(&response), body_of(&again));
}

#[cfg(unix)]
#[tokio::test]
async fn test_installed_apps_degrades_off_windows() {
    let (_dir, addr) = start_server().await;

    let response = get(addr, "/command/installed-apps").await;
    assert_eq!(status_of(&response), 200);

    let report: serde_json::Value = serde_json::from_str(body_of(&response)).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["apps"].as_array().unwrap().len(), 0);
    assert!(report["message"].as_str().unwrap().contains("Windows"));
}

#[tokio::test]
async fn test_network_info_reports_listening_port() {
    let (_dir, addr) = start_server().await;

    let response = get(addr, "/network-info").await;
    assert_eq!(status_of(&response), 200);

    let info: serde_json::Value = serde_json::from_str(body_of(&response)).unwrap();
    assert_eq!(info["port"], u64::from(addr.port()));
    assert!(info["localIP"].is_string());
}

#[tokio::test]
async fn test_cors_preflight_and_headers() {
    let (_dir, addr) = start_server().await;

    let preflight = send(
        addr,
        "OPTIONS /command HTTP/1.1\r\nHost: localhost\r\nOrigin: http://client\r\n\r\n".to_string(),
    )
    .await;
    assert_eq!(status_of(&preflight), 204);
    assert!(preflight.contains("Access-Control-Allow-Origin: *"));
    assert!(preflight.contains("Access-Control-Allow-Methods:"));

    // regular responses carry the open-origin header too
    let listed = get(addr, "/command").await;
    assert!(listed.contains("Access-Control-Allow-Origin: *"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (_dir, addr) = start_server().await;

    let response = get(addr, "/no-such-route").await;
    assert_eq!(status_of(&response), 404);
}
