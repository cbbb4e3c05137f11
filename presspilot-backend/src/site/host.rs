//! Literal execution of free-text site commands through the host CLI.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

/// Hard ceiling the embedding HTTP request relies on; there is no
/// separate execution timeout here.
const COMMAND_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait CommandHost: Send + Sync {
    /// Run a free-text command and capture combined output. The caller
    /// applies the output ceiling.
    async fn run(&self, command: &str) -> Result<String, String>;
}

/// Shells out via `sh -c` when the site CLI binary is present on the
/// host.
pub struct LocalCommandHost {
    cli_path: PathBuf,
}

impl LocalCommandHost {
    /// Detect the site CLI on PATH. Returns None when the host has no
    /// interactive CLI, in which case free-text commands fall back to
    /// emulation and guidance.
    pub fn detect() -> Option<Self> {
        match which::which("wp") {
            Ok(cli_path) => {
                log::info!("site CLI detected at {:?}", cli_path);
                Some(Self { cli_path })
            }
            Err(_) => {
                log::info!("no site CLI on PATH - literal command execution disabled");
                None
            }
        }
    }

    #[cfg(test)]
    pub fn with_path(cli_path: PathBuf) -> Self {
        Self { cli_path }
    }
}

#[async_trait]
impl CommandHost for LocalCommandHost {
    async fn run(&self, command: &str) -> Result<String, String> {
        // The command usually starts with "wp ..."; swap in the resolved
        // binary path so PATH quirks don't matter. Only a whole leading
        // token is replaced.
        let trimmed = command.trim();
        let rest = match trimmed.split_once(char::is_whitespace) {
            Some(("wp", args)) => args.trim(),
            _ if trimmed == "wp" => "",
            _ => trimmed,
        };
        let full = format!("{} {}", self.cli_path.display(), rest);

        let child = Command::new("sh")
            .arg("-c")
            .arg(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = timeout(Duration::from_secs(COMMAND_TIMEOUT_SECS), child)
            .await
            .map_err(|_| format!("command timed out after {}s", COMMAND_TIMEOUT_SECS))?
            .map_err(|e| format!("failed to spawn command: {}", e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stderr.trim_end());
        }

        if output.status.success() {
            Ok(combined)
        } else {
            Err(format!(
                "command exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                combined
            ))
        }
    }
}
