//! Subprocess runner - executes external tools with a timeout

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Errors from running an external tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("Failed to decode output of {program}")]
    Decode { program: String },
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs commands in a fixed working directory
#[derive(Debug, Clone)]
pub struct CommandRunner {
    working_dir: PathBuf,

    /// Timeout for a single command in seconds
    timeout_secs: u64,
}

impl CommandRunner {
    pub fn new(working_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout_secs,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Run `program` with `args` and capture its output
    ///
    /// # Errors
    /// Returns `ToolError` if:
    /// - The program cannot be spawned
    /// - It exits with a non-zero status
    /// - It runs longer than the configured timeout
    /// - stdout is not valid UTF-8
    pub async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ToolError> {
        self.run_masked(program, args, None).await
    }

    /// Like `run`, but `secret` never appears in the logged command line
    pub async fn run_masked(
        &self,
        program: &str,
        args: &[String],
        secret: Option<&str>,
    ) -> Result<CommandOutput, ToolError> {
        let shown = args
            .iter()
            .map(|arg| match secret {
                Some(secret) if !secret.is_empty() && arg.contains(secret) => "***".to_string(),
                _ => arg.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Running {} {} in {}", program, shown, self.working_dir.display());

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(program)
                .args(args)
                .current_dir(&self.working_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ToolError::Timeout {
            program: program.to_string(),
            secs: self.timeout_secs,
        })?;

        let output = result.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!("{} exited with code {}: {}", program, code, stderr);
            return Err(ToolError::Exit {
                program: program.to_string(),
                code,
                stderr,
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| ToolError::Decode {
            program: program.to_string(),
        })?;

        debug!("{} returned {} bytes of output", program, stdout.len());
        Ok(CommandOutput { stdout, stderr })
    }
}
