//! Conversion job types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::EncodingSettings;
use crate::models::{CropMode, JobStatus, OutputKind};
use crate::naming::{is_supported_input, SUPPORTED_EXTENSIONS};

/// Errors from creating jobs or persisting the queue.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Unsupported input '{path}' (expected one of: {})", SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedInput { path: PathBuf },

    #[error("FPS {fps} out of range ({min}..={max})")]
    FpsOutOfRange { fps: u32, min: u32, max: u32 },

    #[error("Failed to write queue file: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Failed to serialize queue: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// One input to convert into one output kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique ID (uuid v4).
    pub id: String,
    /// Display name (input file stem).
    pub name: String,
    pub input: PathBuf,
    pub kind: OutputKind,
    pub fps: u32,
    #[serde(default)]
    pub crop: CropMode,
    #[serde(default)]
    pub status: JobStatus,
    /// Directory for the output; None means next to the input.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Written asset, once done.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Local>,
}

impl ConversionJob {
    /// Validate the input and build a queued job.
    pub fn new(
        input: impl Into<PathBuf>,
        kind: OutputKind,
        fps: u32,
        crop: CropMode,
        encoding: &EncodingSettings,
    ) -> JobResult<Self> {
        let input = input.into();

        if !input.is_file() {
            return Err(JobError::InputNotFound(input));
        }
        if !is_supported_input(&input) {
            return Err(JobError::UnsupportedInput { path: input });
        }
        if !encoding.fps_in_range(fps) {
            return Err(JobError::FpsOutOfRange {
                fps,
                min: encoding.min_fps,
                max: encoding.max_fps,
            });
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: job_name(&input),
            input,
            kind,
            fps,
            crop,
            status: JobStatus::Queued,
            output_dir: None,
            output: None,
            error: None,
            created_at: Local::now(),
        })
    }

    /// Write the output into `dir` instead of next to the input.
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Put the job back in line, as after a run that never finished it.
    pub fn requeue(&mut self) {
        self.status = JobStatus::Queued;
        self.error = None;
    }

    pub fn mark_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.error = None;
    }

    pub fn mark_done(&mut self, output: PathBuf) {
        self.status = JobStatus::Done;
        self.output = Some(output);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
    }

    pub fn mark_cancelled(&mut self) {
        self.status = JobStatus::Cancelled;
    }
}

fn job_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string())
}
