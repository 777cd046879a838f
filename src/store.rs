//! store - persistence for stream deck commands
//!
//! The collection is read from storage on every query and overwritten
//! wholesale on every save. No merge, no shape validation: the client owns
//! the full desired collection and the last writer wins.
//!
//! `CommandStorage` is the injected seam: `CommandStore` backs it with a
//! JSON file, `MemoryStore` keeps everything in memory for tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Default location of the command store file.
pub fn default_store_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("deck").join("commands.json")
}

fn default_kind() -> String {
    "command".to_string()
}

/// A persisted stream deck button backed by a shell invocation.
///
/// `kind` is serialized as `type` and stays a free-form string: reserved
/// action kinds (hotkey, open-app, url) must round-trip through the store
/// without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub payload: String,
}

/// Storage seam for the command collection.
pub trait CommandStorage: Send + Sync {
    /// Read the full persisted collection.
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Command>>> + Send;

    /// Overwrite storage with the given collection.
    fn replace_all(
        &self,
        commands: &[Command],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up a single command by id. `Ok(None)` when no command carries
    /// the id.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Command>>> + Send;
}

/// File-backed command collection.
pub struct CommandStore {
    file_path: PathBuf,
    // Serializes same-process read-modify-write; cross-process races stay
    // last-writer-wins by contract.
    lock: Mutex<()>,
}

impl CommandStore {
    /// Store at the well-known application data location.
    pub fn new() -> Self {
        Self::with_path(default_store_path())
    }

    /// Store at a custom path (useful for testing).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create the parent directory and an empty collection if the backing
    /// file is absent. Idempotent.
    pub async fn ensure_exists(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create command store directory")?;
        }

        if !self.file_path.exists() {
            let empty = serde_json::to_string_pretty(&Vec::<Command>::new())?;
            fs::write(&self.file_path, empty)
                .await
                .context("Failed to initialize command store")?;
        }

        Ok(())
    }

    /// Path of the backing file.
    pub fn store_path(&self) -> &std::path::Path {
        &self.file_path
    }

    async fn read_collection(&self) -> Result<Vec<Command>> {
        self.ensure_exists().await?;

        let content = fs::read_to_string(&self.file_path)
            .await
            .context("Failed to read command store")?;

        // Corrupted JSON propagates: on-disk corruption needs manual
        // intervention and is never silently recovered.
        let commands: Vec<Command> =
            serde_json::from_str(&content).context("Failed to parse command store")?;

        Ok(commands)
    }
}

impl CommandStorage for CommandStore {
    async fn load(&self) -> Result<Vec<Command>> {
        let _guard = self.lock.lock().await;
        self.read_collection().await
    }

    async fn replace_all(&self, commands: &[Command]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_exists().await?;

        let json = serde_json::to_string_pretty(commands)
            .context("Failed to serialize command collection")?;

        fs::write(&self.file_path, json)
            .await
            .context("Failed to write command store")?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Command>> {
        let commands = self.load().await?;
        Ok(commands.into_iter().find(|c| c.id == id))
    }
}

impl Default for CommandStore {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory storage, swappable for the file store in tests.
#[derive(Default)]
pub struct MemoryStore {
    commands: Mutex<Vec<Command>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: Vec<Command>) -> Self {
        Self {
            commands: Mutex::new(commands),
        }
    }
}

impl CommandStorage for MemoryStore {
    async fn load(&self) -> Result<Vec<Command>> {
        Ok(self.commands.lock().await.clone())
    }

    async fn replace_all(&self, commands: &[Command]) -> Result<()> {
        *self.commands.lock().await = commands.to_vec();
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Command>> {
        Ok(self
            .commands
            .lock()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}
