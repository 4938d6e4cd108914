//! Types shared by tool discovery, command building and execution.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// External programs the converter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    Gifski,
    Ffplay,
}

impl Tool {
    /// Executable name looked up on PATH.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::Gifski => "gifski",
            Tool::Ffplay => "ffplay",
        }
    }

    /// Where to get the tool from.
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Ffmpeg | Tool::Ffprobe | Tool::Ffplay => {
                "install FFmpeg from https://ffmpeg.org/ and make sure it is on PATH"
            }
            Tool::Gifski => "install gifski from https://gif.ski/ and make sure it is on PATH",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Errors from locating or running external tools.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} not found ({hint})")]
    NotFound { tool: Tool, hint: &'static str },

    #[error("Failed to start {tool}: {source}")]
    SpawnFailed {
        tool: Tool,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with code {exit_code}: {message}")]
    CommandFailed {
        tool: Tool,
        exit_code: i32,
        message: String,
    },
}

impl ToolError {
    pub fn not_found(tool: Tool) -> Self {
        Self::NotFound {
            tool,
            hint: tool.install_hint(),
        }
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// A fully-built external command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Output path: the value of `-o` when present, else the last argument.
    pub fn output_arg(&self) -> Option<&str> {
        self.value_of("-o")
            .or_else(|| self.args.last().map(String::as_str))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tool)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains([' ', '"', ';', '[', '\'']) {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-empty stderr lines, for the logger's tail buffer.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines().map(str::trim_end).filter(|l| !l.is_empty())
    }
}
