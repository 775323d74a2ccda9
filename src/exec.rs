//! Process execution behind a small trait so OS glue is mockable in tests.
use std::process::{Command, Output};

use anyhow::{Context as _, Result};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Raw exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over command spawning used by the service controller,
/// elevation check, and driver advisory.
///
/// Production code uses [`SystemExecutor`]; tests substitute a mock so no
/// real `sc`/`net`/PowerShell processes are spawned.
pub trait Executor: Send + Sync {
    /// Run a command, allowing failure (non-zero exit is reported in the
    /// result, not as an error).
    ///
    /// # Errors
    ///
    /// Returns an error only when the command cannot be spawned at all
    /// (e.g., the program does not exist on this system).
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }
}
