//! Non-interactive subprocess execution through the user's shell.

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;

pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

/// Captured result of one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Text shown to the user and kept as context: stdout, or stderr when
    /// stdout is empty.
    pub fn display_text(&self) -> &str {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

/// Run `command` with `$SHELL -c` in the current directory.
///
/// stdin is inherited so interactive tools still work; stdout and stderr
/// are captured as lossy UTF-8. There is no timeout.
pub async fn run_shell_command(command: &str) -> Result<CommandOutput> {
    let shell = default_shell();
    let output = Command::new(&shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to spawn {} for {:?}", shell, command))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_shell_command("echo hello").await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.display_text(), "hello\n");
    }

    #[tokio::test]
    async fn test_stderr_used_when_stdout_empty() {
        let out = run_shell_command("echo oops 1>&2; exit 3").await.unwrap();
        assert!(!out.success());
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.display_text(), "oops\n");
    }

    #[tokio::test]
    async fn test_stdout_preferred_over_stderr() {
        let out = run_shell_command("echo out; echo err 1>&2").await.unwrap();
        assert_eq!(out.display_text(), "out\n");
    }

    #[tokio::test]
    async fn test_blank_stdout_is_still_stdout() {
        let out = run_shell_command("printf '\\n'; echo err 1>&2").await.unwrap();
        assert_eq!(out.stdout, "\n");
        assert_eq!(out.display_text(), "\n");
    }
}
