//! deck_core - backend for a personal stream deck remote
//!
//! A local HTTP/HTTPS server exposes user-defined shell macros to a client
//! on the same network. Commands persist to a flat JSON file and run through
//! the host shell.
//!
//! Modules:
//! - store: JSON-file persistence for the command collection
//! - safety: denylist gate applied before any spawn
//! - normalize: platform rewriting of payloads (URLs, Windows paths)
//! - platform: host shell adapter with captured output
//! - executor: lookup, gate, normalize, spawn, classify
//! - scanner: installed application discovery (Windows)
//! - presets: built-in multimedia command definitions
//! - server: HTTP/HTTPS API surface
//! - tls: certificate loading for the HTTPS listener
//! - config: resolved server configuration
//! - net_info: LAN address discovery for the client
//! - logging: component-tagged JSON log lines

pub mod config;
pub mod executor;
pub mod logging;
pub mod net_info;
pub mod normalize;
pub mod platform;
pub mod presets;
pub mod safety;
pub mod scanner;
pub mod server;
pub mod store;
pub mod tls;

// Re-export key types for convenience
pub use config::ServerConfig;

pub use executor::{CommandExecutor, ExecError, ExecOutcome};

pub use platform::{Platform, ShellAdapter, SpawnOutcome};

pub use scanner::{AppScanner, InstalledApp, ScanReport};

pub use server::DeckServer;

pub use store::{Command, CommandStorage, CommandStore, MemoryStore};
