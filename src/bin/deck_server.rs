/*!
 * deck_server - stream deck HTTP/HTTPS server
 *
 * Serves the command collection, executes commands on request, and exposes
 * the installed application scan. Configuration comes from flags with
 * environment fallbacks (PORT, DECK_DATA_FILE, DECK_TLS_CERT, DECK_TLS_KEY).
 */

use clap::Parser;
use deck_core::config::{ServerConfig, DEFAULT_PORT};
use deck_core::logging::{self, LogLevel};
use deck_core::net_info;
use deck_core::server::DeckServer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deck_server")]
#[command(about = "Personal stream deck server", long_about = None)]
struct Cli {
    /// HTTP listening port (falls back to $PORT, then 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Command store file (falls back to $DECK_DATA_FILE, then the platform
    /// data directory)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// PEM certificate chain; with --tls-key, enables the HTTPS listener
    #[arg(long)]
    tls_cert: Option<PathBuf>,

    /// PEM private key; with --tls-cert, enables the HTTPS listener
    #[arg(long)]
    tls_key: Option<PathBuf>,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

fn resolve_config(cli: &Cli) -> ServerConfig {
    let defaults = ServerConfig::default();

    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    ServerConfig {
        port,
        data_path: cli
            .data_file
            .clone()
            .or_else(|| env_path("DECK_DATA_FILE"))
            .unwrap_or(defaults.data_path),
        tls_cert: cli.tls_cert.clone().or_else(|| env_path("DECK_TLS_CERT")),
        tls_key: cli.tls_key.clone().or_else(|| env_path("DECK_TLS_KEY")),
    }
}

fn print_banner(config: &ServerConfig) {
    let lan = net_info::local_lan_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "localhost".to_string());

    println!();
    println!("====================================");
    println!("  Stream Deck Server Started");
    println!("====================================");
    println!();
    println!("  Local:    http://localhost:{}", config.port);
    println!("  Network:  http://{}:{}", lan, config.port);
    if config.tls_enabled() {
        println!("  HTTPS:    https://{}:{}", lan, config.https_port());
    }
    println!();
    println!("  Point the client app at the network URL above.");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(LogLevel::parse(&cli.log_level));

    let config = resolve_config(&cli);

    let server = match DeckServer::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    print_banner(&config);

    if let Err(e) = server.serve().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
