//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::crop::CropWindow;
use crate::encode::{select_backend, EncodeOutcome};
use crate::jobs::ConversionJob;
use crate::logging::JobLogger;
use crate::models::{EncoderBackend, InputKind, OutputProfile};
use crate::probe::{probe_media, MediaInfo};
use crate::tools::{ToolCommand, ToolError, ToolOutput, ToolPaths, ToolRunner};

use super::errors::{StepError, StepResult};
use super::pipeline::CancelHandle;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the job and shared resources that steps can read but not
/// modify. Mutable state goes in `JobState`.
pub struct Context {
    /// The job being converted.
    pub job: ConversionJob,
    /// Application settings.
    pub settings: Settings,
    /// Job name (input stem), used in logs and errors.
    pub job_name: String,
    /// Profile for the job's output kind, with limit overrides applied.
    pub profile: OutputProfile,
    /// Resolved external tools.
    pub tools: ToolPaths,
    /// Executes external commands.
    pub runner: Arc<dyn ToolRunner>,
    /// Job-specific working directory (under temp_root).
    pub work_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Cancellation flag shared with the pipeline and queue.
    cancel: CancelHandle,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        job: ConversionJob,
        settings: Settings,
        tools: ToolPaths,
        runner: Arc<dyn ToolRunner>,
        work_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        let profile = OutputProfile::resolve(job.kind, &settings.limits);
        Self {
            job_name: job.name.clone(),
            job,
            settings,
            profile,
            tools,
            runner,
            work_dir,
            logger,
            cancel: CancelHandle::new(),
            progress_callback: None,
        }
    }

    /// Share a cancellation flag so long-running steps can stop early.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Encoder backend this job will use.
    pub fn backend(&self) -> EncoderBackend {
        select_backend(&self.profile, &self.tools, self.settings.tools.prefer_gifski)
    }

    /// Where the final asset goes; None means next to the input.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.job
            .output_dir
            .clone()
            .or_else(|| self.settings.paths.output_dir())
    }

    /// Run an external command, echoing it and capturing its stderr in the log tail.
    pub fn run_tool(&self, command: &ToolCommand) -> StepResult<ToolOutput> {
        self.logger.command(&command.to_string());
        match self.runner.run(command) {
            Ok(output) => {
                for line in output.stderr_lines() {
                    self.logger.output_line(line);
                }
                Ok(output)
            }
            Err(e) => {
                if let ToolError::CommandFailed { message, .. } = &e {
                    self.logger.output_line(message);
                }
                Err(e.into())
            }
        }
    }

    /// Probe a file with ffprobe.
    pub fn probe(&self, path: &Path) -> StepResult<MediaInfo> {
        Ok(probe_media(self.runner.as_ref(), &self.tools, path)?)
    }

    /// Reject media longer than the output kind allows (stickers).
    ///
    /// An unknown duration only warns.
    pub fn check_duration_limit(&self, media: &MediaInfo) -> StepResult<()> {
        let Some(max) = self.profile.max_duration_secs else {
            return Ok(());
        };
        match media.duration_secs {
            Some(duration) if duration >= max => Err(StepError::invalid_input(format!(
                "{} must be shorter than {} seconds ({} is {:.2}s)",
                self.profile.kind,
                max,
                media.path.display(),
                duration
            ))),
            Some(_) => Ok(()),
            None => {
                self.logger.warn(&format!(
                    "Duration of {} unknown, cannot check the {} length limit",
                    media.path.display(),
                    self.profile.kind
                ));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
impl Context {
    /// Emote job for `<dir>/clip.mp4` with bare tool names and a fake runner.
    pub(crate) fn for_test(dir: &Path, runner: Arc<dyn ToolRunner>) -> Self {
        use crate::models::{CropMode, OutputKind};

        let input = dir.join("clip.mp4");
        crate::tools::fake::touch(&input);
        let settings = Settings::default();
        let job = ConversionJob::new(input, OutputKind::Emote, 30, CropMode::Auto, &settings.encoding)
            .unwrap();
        Self::for_job(job, dir, runner)
    }

    pub(crate) fn for_job(job: ConversionJob, dir: &Path, runner: Arc<dyn ToolRunner>) -> Self {
        use crate::logging::LogConfig;

        let work_dir = dir.join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        let logger = JobLogger::new(&job.name, dir.join("logs"), LogConfig::default(), None).unwrap();
        Self::new(
            job,
            Settings::default(),
            ToolPaths::bare(),
            runner,
            work_dir,
            Arc::new(logger),
        )
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section and written once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect: Option<InspectOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<FramesOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode: Option<EncodeOutcome>,
    /// Intermediate files to delete once the job is finished.
    #[serde(default)]
    pub temp_files: Vec<PathBuf>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Media the next step should read: cropped, else assembled, else the input.
    pub fn current_media(&self) -> Option<&MediaInfo> {
        self.crop
            .as_ref()
            .map(|c| &c.media)
            .or_else(|| self.sequence.as_ref().map(|s| &s.media))
            .or_else(|| self.inspect.as_ref().map(|i| &i.media))
    }

    /// Record an intermediate file for cleanup.
    pub fn track_temp(&mut self, path: impl Into<PathBuf>) {
        self.temp_files.push(path.into());
    }
}

/// Output from the Inspect step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectOutput {
    pub media: MediaInfo,
    pub input_kind: InputKind,
}

/// Output from the Sequence step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceOutput {
    /// printf pattern the video was assembled from.
    pub pattern: PathBuf,
    pub start_number: u32,
    /// Probed info of the assembled video.
    pub media: MediaInfo,
}

/// Output from the Crop step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropOutput {
    pub window: CropWindow,
    /// Probed info of the cropped video.
    pub media: MediaInfo,
}

/// Output from the Frames step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramesOutput {
    pub dir: PathBuf,
    /// Frame files in order.
    pub frames: Vec<PathBuf>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step had nothing to do for this job.
    Skipped(String),
}
