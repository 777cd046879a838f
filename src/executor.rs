//! executor - runs a stored command through the host shell
//!
//! Pipeline per request: store lookup, safety filter, normalization, shell
//! spawn, result classification. The filter and the lookup both short-circuit
//! before any process is spawned.

use crate::normalize;
use crate::platform::{ShellAdapter, SpawnOutcome};
use crate::safety;
use crate::store::{CommandStorage, CommandStore};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Output reported when a successful command produced no stdout.
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "command executed";

/// Command-line patterns whose nonzero exit status is still a success.
///
/// `explorer` and the empty-title `start ""` launcher routinely return
/// nonzero after opening their window. Matched case-insensitively against
/// the normalized command line.
const SUCCESS_OVERRIDES: &[&str] = &["explorer", "start \"\""];

#[derive(Debug, Error)]
pub enum ExecError {
    /// No stored command carries the requested id.
    #[error("Command not found")]
    NotFound,
    /// The payload matched the safety denylist.
    #[error("Command not allowed")]
    Forbidden,
    /// The spawned process failed; carries the captured diagnostic.
    #[error("{0}")]
    Failed(String),
    /// Storage access failed (I/O or corrupted JSON).
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecOutcome {
    pub success: bool,
    pub output: String,
}

/// True when the command line matches the success-override policy table.
pub fn overrides_failure(command_line: &str) -> bool {
    let lowered = command_line.to_lowercase();
    SUCCESS_OVERRIDES
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

pub struct CommandExecutor<S: CommandStorage = CommandStore> {
    store: Arc<S>,
    adapter: ShellAdapter,
}

impl<S: CommandStorage> CommandExecutor<S> {
    pub fn new(store: Arc<S>, adapter: ShellAdapter) -> Self {
        Self { store, adapter }
    }

    /// Execute the stored command with the given id.
    pub async fn execute(&self, id: &str) -> Result<ExecOutcome, ExecError> {
        let command = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ExecError::NotFound)?;

        let platform = self.adapter.platform();

        if !safety::is_allowed(&command.payload, platform) {
            return Err(ExecError::Forbidden);
        }

        let normalized = normalize::normalize(&command.payload, platform);

        match self.adapter.spawn(&normalized).await {
            Ok(outcome) => classify(&normalized, outcome),
            // Spawn errors get the same override treatment as nonzero exits.
            Err(e) => {
                if overrides_failure(&normalized) {
                    Ok(ExecOutcome {
                        success: true,
                        output: EMPTY_OUTPUT_PLACEHOLDER.to_string(),
                    })
                } else {
                    Err(ExecError::Failed(e.to_string()))
                }
            }
        }
    }
}

fn classify(command_line: &str, outcome: SpawnOutcome) -> Result<ExecOutcome, ExecError> {
    if outcome.exit_ok || overrides_failure(command_line) {
        let output = if outcome.stdout.is_empty() {
            EMPTY_OUTPUT_PLACEHOLDER.to_string()
        } else {
            outcome.stdout
        };
        return Ok(ExecOutcome {
            success: true,
            output,
        });
    }

    let diagnostic = if outcome.stderr.trim().is_empty() {
        match outcome.exit_code {
            Some(code) => format!("process exited with status {}", code),
            None => "process terminated by signal".to_string(),
        }
    } else {
        outcome.stderr
    };

    Err(ExecError::Failed(diagnostic))
}
