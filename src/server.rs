//! server - HTTP/HTTPS surface for the stream deck client
//!
//! Hand-rolled HTTP/1.1 over a tokio listener, one task per connection,
//! `Connection: close` per request. CORS is open to every origin: the client
//! runs on other devices on the same LAN.
//!
//! Endpoints:
//!   GET  /command                    - full command collection
//!   POST /command                    - replace the collection (JSON array body)
//!   POST /command/execute/:id        - run one command, report {success, output}
//!   GET  /command/presets/multimedia - static preset definitions
//!   GET  /command/installed-apps     - installed application scan
//!   GET  /network-info               - primary LAN address and URL
//!   GET  /                           - server identity

use crate::config::ServerConfig;
use crate::executor::{CommandExecutor, ExecError};
use crate::logging;
use crate::net_info;
use crate::platform::{Platform, ShellAdapter};
use crate::presets;
use crate::scanner::AppScanner;
use crate::store::{Command, CommandStorage, CommandStore};
use crate::tls;
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

const COMPONENT: &str = "SERVER";

/// Header block limit; requests with larger headers are rejected.
const MAX_HEADER_BYTES: usize = 16 * 1024;
/// Body limit; a full command collection is tens of entries, not megabytes.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared per-server state handed to every connection task.
pub struct AppState {
    store: Arc<CommandStore>,
    executor: CommandExecutor,
    scanner: AppScanner,
    platform: Platform,
    port: u16,
}

/// A bound server, ready to serve. Binding is split from serving so tests
/// can bind port 0 and read the real address back.
pub struct DeckServer {
    listener: TcpListener,
    tls_listener: Option<(TcpListener, TlsAcceptor)>,
    state: Arc<AppState>,
}

impl DeckServer {
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let platform = Platform::current();
        let adapter = ShellAdapter::new(platform);

        let store = Arc::new(CommandStore::with_path(&config.data_path));
        store.ensure_exists().await?;

        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .context(format!("Failed to bind port {}", config.port))?;
        let port = listener.local_addr()?.port();

        let tls_listener = match (&config.tls_cert, &config.tls_key) {
            (Some(cert), Some(key)) => match tls::load_acceptor(cert, key) {
                Ok(acceptor) => {
                    let https = TcpListener::bind(("0.0.0.0", config.https_port()))
                        .await
                        .context(format!("Failed to bind HTTPS port {}", config.https_port()))?;
                    logging::info(
                        COMPONENT,
                        &format!("HTTPS listener enabled on port {}", config.https_port()),
                    );
                    Some((https, acceptor))
                }
                Err(e) => {
                    logging::warn(
                        COMPONENT,
                        &format!("TLS material failed to load, serving HTTP only: {:#}", e),
                    );
                    None
                }
            },
            _ => None,
        };

        let state = Arc::new(AppState {
            executor: CommandExecutor::new(Arc::clone(&store), adapter),
            scanner: AppScanner::new(adapter),
            store,
            platform,
            port,
        });

        Ok(Self {
            listener,
            tls_listener,
            state,
        })
    }

    /// Address of the HTTP listener.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process exits.
    pub async fn serve(self) -> Result<()> {
        let Self {
            listener,
            tls_listener,
            state,
        } = self;

        if let Some((https, acceptor)) = tls_listener {
            let tls_state = Arc::clone(&state);
            tokio::spawn(async move {
                serve_tls(https, acceptor, tls_state).await;
            });
        }

        logging::info(
            COMPONENT,
            &format!("listening on {}", listener.local_addr().map(|a| a.to_string()).unwrap_or_default()),
        );

        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        handle_connection(&mut socket, state).await;
                    });
                }
                Err(e) => {
                    logging::warn(COMPONENT, &format!("accept error: {}", e));
                }
            }
        }
    }
}

async fn serve_tls(listener: TcpListener, acceptor: TlsAcceptor, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((socket, _)) => {
                let acceptor = acceptor.clone();
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    match acceptor.accept(socket).await {
                        Ok(mut tls_stream) => handle_connection(&mut tls_stream, state).await,
                        Err(e) => logging::debug(COMPONENT, &format!("TLS handshake failed: {}", e)),
                    }
                });
            }
            Err(e) => {
                logging::warn(COMPONENT, &format!("TLS accept error: {}", e));
            }
        }
    }
}

async fn handle_connection<S>(stream: &mut S, state: Arc<AppState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let response = match read_request(stream).await {
        Ok(request) => {
            logging::debug(
                COMPONENT,
                &format!("{} {}", request.method, request.path),
            );
            route(&state, &request).await
        }
        Err(e) => {
            logging::debug(COMPONENT, &format!("bad request: {:#}", e));
            http_json(400, &json!({"message": "Bad request"}).to_string())
        }
    };

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

/// Read one HTTP/1.1 request: header block, then Content-Length body bytes.
async fn read_request<S>(stream: &mut S) -> Result<Request>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            bail!("header block too large");
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("connection closed before headers completed");
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let header_text = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let mut lines = header_text.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    if method.is_empty() || path.is_empty() {
        bail!("malformed request line");
    }

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        bail!("body too large");
    }

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("connection closed before body completed");
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(Request { method, path, body })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn route(state: &AppState, request: &Request) -> String {
    let method = request.method.as_str();
    // Ignore any query string; routes carry no parameters there.
    let path = request.path.split('?').next().unwrap_or_default();

    if method == "OPTIONS" {
        return http_preflight();
    }

    match (method, path) {
        ("GET", "/") => http_json(
            200,
            &json!({
                "name": "deck_server",
                "version": env!("CARGO_PKG_VERSION"),
            })
            .to_string(),
        ),

        ("GET", "/command") => match state.store.load().await {
            Ok(commands) => match serde_json::to_string(&commands) {
                Ok(body) => http_json(200, &body),
                Err(e) => internal_error(&e.to_string()),
            },
            Err(e) => internal_error(&format!("{:#}", e)),
        },

        ("POST", "/command") => {
            let commands: Vec<Command> = match serde_json::from_slice(&request.body) {
                Ok(commands) => commands,
                Err(_) => {
                    return http_json(400, &json!({"message": "Invalid command collection"}).to_string())
                }
            };
            match state.store.replace_all(&commands).await {
                Ok(()) => http_json(200, &json!({"success": true}).to_string()),
                Err(e) => internal_error(&format!("{:#}", e)),
            }
        }

        ("POST", _) if path.starts_with("/command/execute/") => {
            let id = &path["/command/execute/".len()..];
            execute_response(state, id).await
        }

        ("GET", "/command/presets/multimedia") => {
            let presets = presets::multimedia_presets(state.platform);
            match serde_json::to_string(presets) {
                Ok(body) => http_json(200, &body),
                Err(e) => internal_error(&e.to_string()),
            }
        }

        ("GET", "/command/installed-apps") => {
            let report = state.scanner.scan().await;
            match serde_json::to_string(&report) {
                Ok(body) => http_json(200, &body),
                Err(e) => internal_error(&e.to_string()),
            }
        }

        ("GET", "/network-info") => {
            let info = net_info::network_info(state.port);
            match serde_json::to_string(&info) {
                Ok(body) => http_json(200, &body),
                Err(e) => internal_error(&e.to_string()),
            }
        }

        _ => http_json(404, &json!({"message": "Not found"}).to_string()),
    }
}

async fn execute_response(state: &AppState, id: &str) -> String {
    if id.is_empty() {
        return http_json(404, &json!({"message": "Command not found"}).to_string());
    }

    match state.executor.execute(id).await {
        Ok(outcome) => match serde_json::to_string(&outcome) {
            Ok(body) => http_json(200, &body),
            Err(e) => internal_error(&e.to_string()),
        },
        Err(ExecError::NotFound) => {
            http_json(404, &json!({"message": "Command not found"}).to_string())
        }
        Err(ExecError::Forbidden) => {
            http_json(403, &json!({"message": "Command not allowed"}).to_string())
        }
        Err(ExecError::Failed(diagnostic)) => {
            logging::warn(COMPONENT, &format!("command {} failed: {}", id, diagnostic.trim()));
            internal_error(&diagnostic)
        }
        Err(ExecError::Store(e)) => internal_error(&format!("{:#}", e)),
    }
}

fn internal_error(message: &str) -> String {
    http_json(500, &json!({"message": message}).to_string())
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn cors_headers() -> &'static str {
    "Access-Control-Allow-Origin: *\r\n\
     Access-Control-Allow-Methods: GET,HEAD,PUT,PATCH,POST,DELETE\r\n\
     Access-Control-Allow-Headers: Content-Type"
}

fn http_preflight() -> String {
    format!(
        "HTTP/1.1 204 No Content\r\n{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        cors_headers()
    )
}

fn http_json(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        cors_headers(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[test]
    fn test_http_json_shape() {
        let response = http_json(200, "{\"ok\":true}");
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json"));
        assert!(response.contains("Access-Control-Allow-Origin: *"));
        assert!(response.contains("Content-Length: 11"));
        assert!(response.ends_with("{\"ok\":true}"));
    }

    #[test]
    fn test_status_text_covers_error_taxonomy() {
        assert_eq!(status_text(403), "Forbidden");
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(500), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_read_request_parses_method_path_and_body() {
        let (mut client, mut server) = duplex(8 * 1024);
        client
            .write_all(b"POST /command HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n[]")
            .await
            .unwrap();

        let request = read_request(&mut server).await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/command");
        assert_eq!(request.body, b"[]");
    }

    #[tokio::test]
    async fn test_read_request_without_body() {
        let (mut client, mut server) = duplex(8 * 1024);
        client
            .write_all(b"GET /command HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap();

        let request = read_request(&mut server).await.unwrap();
        assert_eq!(request.method, "GET");
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_read_request_rejects_truncated_stream() {
        let (mut client, mut server) = duplex(8 * 1024);
        client.write_all(b"GET /comm").await.unwrap();
        drop(client);

        assert!(read_request(&mut server).await.is_err());
    }
}
