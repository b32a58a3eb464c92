// ABOUTME: Deployment CLI seam: trait for invoking the external tool, plus the subprocess impl.
// ABOUTME: Each invocation receives the isolated session home; no global process state.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch {bin}: {source}")]
    Spawn {
        bin: String,
        source: std::io::Error,
    },
}

/// Captured result of one CLI invocation. Stdout is kept for parsing;
/// both streams are mirrored to the host's stderr for the operator.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
        }
    }

    pub fn failed(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(|line| line.trim_end_matches('\r'))
    }
}

/// The external deployment CLI as a capability. Implemented by the real
/// subprocess runner and by test doubles.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the CLI with `args`, scoped to the session config home `home`.
    async fn run(&self, home: &Path, args: &[String]) -> Result<CommandOutput, RunnerError>;
}

/// Subprocess implementation. The session home travels as part of each
/// child's environment, never the host's.
pub struct CfCli {
    bin: String,
}

impl CfCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl CommandRunner for CfCli {
    async fn run(&self, home: &Path, args: &[String]) -> Result<CommandOutput, RunnerError> {
        tracing::debug!(bin = %self.bin, ?args, home = %home.display(), "invoking deployment CLI");

        let output = Command::new(&self.bin)
            .args(args)
            .env("CF_HOME", home)
            .env("CF_COLOR", "true")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        // Mirror both streams so the operator sees what the tool said.
        eprint!("{stdout}");
        eprint!("{}", String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout,
        })
    }
}
