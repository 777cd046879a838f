//! platform - host shell adapter
//!
//! One `Platform` is detected at startup and threaded through the safety
//! filter, the normalizer and the executor.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Cap on captured stdout/stderr per spawn.
pub const MAX_CAPTURE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// Detect the platform of the running process.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// The shell binary used for command execution.
    pub fn shell_name(&self) -> &'static str {
        match self {
            Platform::Windows => "cmd.exe",
            Platform::Posix => "/bin/sh",
        }
    }
}

/// Result of one shell spawn, streams already collected.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub exit_ok: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Spawns command lines through the platform shell with captured output.
#[derive(Debug, Clone, Copy)]
pub struct ShellAdapter {
    platform: Platform,
}

impl ShellAdapter {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Run a single command line through the shell and wait for it.
    ///
    /// No timeout is applied: a hanging command ties up only the request
    /// that spawned it. The console window is hidden on Windows.
    pub async fn spawn(&self, command_line: &str) -> Result<SpawnOutcome> {
        let mut cmd = match self.platform {
            Platform::Windows => {
                let mut c = Command::new("cmd.exe");
                c.arg("/C").arg(command_line);
                c
            }
            Platform::Posix => {
                let mut c = Command::new("/bin/sh");
                c.arg("-c").arg(command_line);
                c
            }
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let child = cmd
            .spawn()
            .context(format!("Failed to spawn {}", self.platform.shell_name()))?;

        let output = child
            .wait_with_output()
            .await
            .context("Failed to collect shell output")?;

        Ok(SpawnOutcome {
            exit_ok: output.status.success(),
            exit_code: output.status.code(),
            stdout: truncate_capture(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: truncate_capture(String::from_utf8_lossy(&output.stderr).into_owned()),
        })
    }
}

fn truncate_capture(mut text: String) -> String {
    if text.len() > MAX_CAPTURE_BYTES {
        let mut cut = MAX_CAPTURE_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
