//! Execution of external tool commands.

use std::process::Command;

use super::types::{ToolCommand, ToolError, ToolOutput, ToolResult};

/// Something that can run a [`ToolCommand`].
///
/// The pipeline only talks to FFmpeg and friends through this trait, so
/// tests can substitute a scripted runner.
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// A non-zero exit is an error.
    fn run(&self, command: &ToolCommand) -> ToolResult<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<ToolOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!("Running {}: {:?}", command.tool, cmd);

        let output = cmd.output().map_err(|e| ToolError::SpawnFailed {
            tool: command.tool,
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no error output")
                .to_string();
            return Err(ToolError::CommandFailed {
                tool: command.tool,
                exit_code: output.status.code().unwrap_or(-1),
                message,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
