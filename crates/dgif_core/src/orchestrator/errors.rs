//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::encode::EncodeError;
use crate::probe::ProbeError;
use crate::tools::ToolError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up job (create directories, logger).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external command failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// A required external tool is not installed.
    #[error("{0}")]
    ToolMissing(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// Tool output could not be understood.
    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    /// A previous step did not record what this one needs.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// The step noticed a cancel request and stopped.
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn parse_error(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

impl From<ToolError> for StepError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::CommandFailed {
                tool,
                exit_code,
                message,
            } => Self::command_failed(tool.to_string(), exit_code, message),
            ToolError::SpawnFailed { tool, source } => {
                Self::io_error(format!("starting {}", tool), source)
            }
            e @ ToolError::NotFound { .. } => Self::ToolMissing(e.to_string()),
        }
    }
}

impl From<ProbeError> for StepError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::FileNotFound(path) => Self::file_not_found(path.display().to_string()),
            ProbeError::Tool(e) => e.into(),
            ProbeError::Parse(e) => Self::parse_error("ffprobe output", e.to_string()),
            e @ (ProbeError::NoVideoStream(_) | ProbeError::InvalidDimensions { .. }) => {
                Self::invalid_input(e.to_string())
            }
        }
    }
}

impl From<EncodeError> for StepError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Tool(e) => e.into(),
            EncodeError::Io { path, source } => {
                Self::io_error(format!("encoding {}", path.display()), source)
            }
            EncodeError::OutputMissing(path) => Self::invalid_output(format!(
                "encoder produced no output at {}",
                path.display()
            )),
            EncodeError::NoFrames(path) => {
                Self::precondition_failed(format!("no frames in {}", path.display()))
            }
            e @ EncodeError::Cancelled { .. } => Self::Cancelled(e.to_string()),
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
