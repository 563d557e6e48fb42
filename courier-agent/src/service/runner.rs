//! Process runner
//!
//! Spawns the program of a step type in the step folder and collects its
//! output as log lines. Launch failures become a failed output, never an
//! error, so a broken toolchain fails the step and not the pipeline set-up.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Invocation;

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub logs: Vec<String>,
}

impl RunOutput {
    pub fn succeeded(logs: Vec<String>) -> Self {
        Self {
            success: true,
            logs,
        }
    }

    pub fn failed(logs: Vec<String>) -> Self {
        Self {
            success: false,
            logs,
        }
    }
}

/// Runs step commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` through `invocation` in `folder` and waits for it
    async fn run(&self, invocation: &Invocation, folder: &Path, command: &str) -> RunOutput;
}

/// Runs commands as local child processes
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, folder: &Path, command: &str) -> RunOutput {
        let args = invocation.arguments(command);
        let mut logs = vec![format!(
            "Executing command:\n{} {}",
            invocation.program,
            args.join(" ")
        )];

        tracing::debug!("Running {} {:?} in {}", invocation.program, args, folder.display());

        let output = Command::new(&invocation.program)
            .args(&args)
            .current_dir(folder)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                logs.extend(output_lines(&output.stdout));
                logs.extend(output_lines(&output.stderr));

                if output.status.success() {
                    RunOutput::succeeded(logs)
                } else {
                    logs.push(format!("Command exited with {}", output.status));
                    RunOutput::failed(logs)
                }
            }
            Err(e) => {
                logs.push(format!("Failed to start '{}': {}", invocation.program, e));
                RunOutput::failed(logs)
            }
        }
    }
}

/// Non-blank lines of a captured stream
fn output_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_output_lines() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::shell("sh", &["-c"]);

        let output = ProcessRunner
            .run(&invocation, dir.path(), "echo one; echo; echo two >&2")
            .await;

        assert!(output.success);
        assert!(output.logs[0].starts_with("Executing command:"));
        assert!(output.logs.contains(&"one".to_string()));
        assert!(output.logs.contains(&"two".to_string()));
        assert!(!output.logs.iter().any(|line| line.is_empty()));
    }

    #[tokio::test]
    async fn test_runs_in_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let invocation = Invocation::shell("sh", &["-c"]);

        let output = ProcessRunner.run(&invocation, dir.path(), "cat marker.txt").await;

        assert!(output.success);
        assert_eq!(output.logs.last().map(String::as_str), Some("here"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::shell("sh", &["-c"]);

        let output = ProcessRunner.run(&invocation, dir.path(), "exit 3").await;

        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_missing_program_is_a_failed_output() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::tool("courier-no-such-program");

        let output = ProcessRunner.run(&invocation, dir.path(), "--version").await;

        assert!(!output.success);
        assert!(output.logs.last().unwrap().starts_with("Failed to start"));
    }
}
