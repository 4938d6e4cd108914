//! Queue processor for running jobs from the job queue.
//!
//! Takes queued jobs in order, runs each through the standard pipeline
//! in its own work directory, writes the status back into the queue,
//! and cleans up intermediates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::jobs::{ConversionJob, JobQueue};
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::tools::{ToolPaths, ToolRunner};

use super::pipeline::CancelHandle;
use super::types::{Context, JobState, ProgressCallback};
use super::{create_standard_pipeline, PipelineRunResult};

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Job ID that was processed.
    pub job_id: String,
    /// Whether the job completed successfully.
    pub success: bool,
    /// Whether the job stopped because of a cancel request.
    pub cancelled: bool,
    /// Path to the written asset (if successful).
    pub output_path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    /// False when the asset was written but is still over the limit.
    pub fits: bool,
    /// Error message (if failed).
    pub error: Option<String>,
    /// Steps that completed.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl JobResult {
    /// Create a successful result from the final job state.
    pub fn success(job_id: String, state: &JobState, run_result: PipelineRunResult) -> Self {
        let encode = state.encode.as_ref();
        Self {
            job_id,
            success: true,
            cancelled: false,
            output_path: encode.map(|e| e.output.clone()),
            size_bytes: encode.map(|e| e.size_bytes),
            fits: encode.is_some_and(|e| e.fits),
            error: None,
            steps_completed: run_result.steps_completed,
            steps_skipped: run_result.steps_skipped,
        }
    }

    /// Create a failed result.
    pub fn failure(job_id: String, error: impl Into<String>) -> Self {
        Self {
            job_id,
            success: false,
            cancelled: false,
            output_path: None,
            size_bytes: None,
            fits: false,
            error: Some(error.into()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        }
    }

    /// Create a result for a job stopped by a cancel request.
    pub fn cancelled(job_id: String) -> Self {
        Self {
            cancelled: true,
            ..Self::failure(job_id, "Cancelled")
        }
    }
}

/// Runs queued jobs through the pipeline, one at a time.
///
/// # Example
///
/// ```ignore
/// let processor = QueueProcessor::new(settings, tools, Arc::new(SystemRunner), log_dir, temp_root);
/// let cancel = processor.cancel_handle();
/// let results = processor.process_queue(&mut queue, |_| None, |_| None);
/// ```
pub struct QueueProcessor {
    /// Application settings.
    settings: Settings,
    /// Resolved external tools.
    tools: ToolPaths,
    runner: Arc<dyn ToolRunner>,
    /// Directory for per-job log files.
    log_dir: PathBuf,
    /// Parent of the per-job work directories.
    temp_root: PathBuf,
    /// Shared by every pipeline this processor runs.
    cancel: CancelHandle,
}

impl QueueProcessor {
    pub fn new(
        settings: Settings,
        tools: ToolPaths,
        runner: Arc<dyn ToolRunner>,
        log_dir: PathBuf,
        temp_root: PathBuf,
    ) -> Self {
        Self {
            settings,
            tools,
            runner,
            log_dir,
            temp_root,
            cancel: CancelHandle::new(),
        }
    }

    /// Share an existing cancellation flag.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    /// Handle that stops the current job at its next step boundary and
    /// leaves the remaining jobs queued.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Process a single job.
    ///
    /// # Arguments
    /// * `job` - The job to convert
    /// * `log_callback` - Optional callback for front-end log output
    /// * `progress_callback` - Optional callback for progress updates
    pub fn process_job(
        &self,
        job: &ConversionJob,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> JobResult {
        let job_work_dir = self.temp_root.join(&job.id);
        if let Err(e) = fs::create_dir_all(&job_work_dir) {
            return JobResult::failure(
                job.id.clone(),
                format!("Failed to create work directory: {}", e),
            );
        }

        let logger = match JobLogger::new(
            &job.name,
            &self.log_dir,
            LogConfig::from_settings(&self.settings.logging),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                remove_work_dir(&job_work_dir, None);
                return JobResult::failure(job.id.clone(), format!("Failed to create logger: {}", e));
            }
        };

        let mut ctx = Context::new(
            job.clone(),
            self.settings.clone(),
            self.tools.clone(),
            Arc::clone(&self.runner),
            job_work_dir.clone(),
            Arc::clone(&logger),
        );
        ctx = ctx.with_cancel_handle(self.cancel.clone());
        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        ctx.logger.info(&format!(
            "Starting job: {} -> {} at {} fps, crop {}",
            job.input.display(),
            job.kind,
            job.fps,
            job.crop
        ));

        let pipeline = create_standard_pipeline().with_cancel_handle(self.cancel.clone());
        let mut state = JobState::new(&job.id);

        let result = match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => JobResult::success(job.id.clone(), &state, run_result),
            Err(e) if e.is_cancelled() || self.cancel.is_cancelled() => {
                ctx.logger.warn("Job cancelled");
                JobResult::cancelled(job.id.clone())
            }
            Err(e) => {
                ctx.logger.error(&e.to_string());
                JobResult::failure(job.id.clone(), e.to_string())
            }
        };

        if self.settings.encoding.keep_temp_files {
            ctx.logger
                .info(&format!("Keeping temporary files in {}", job_work_dir.display()));
        } else {
            for path in &state.temp_files {
                remove_temp(path, &logger);
            }
            remove_work_dir(&job_work_dir, Some(&logger));
        }

        logger.close();
        result
    }

    /// Run every queued job in order, saving the queue after each status change.
    ///
    /// Stops between jobs once cancelled; jobs not yet started stay `Queued`.
    ///
    /// # Arguments
    /// * `queue` - Queue to take jobs from and write status back to
    /// * `log_callback_factory` - Creates a log callback per job ID
    /// * `progress_callback_factory` - Creates a progress callback per job ID
    pub fn process_queue<F, G>(
        &self,
        queue: &mut JobQueue,
        log_callback_factory: F,
        progress_callback_factory: G,
    ) -> Vec<JobResult>
    where
        F: Fn(&str) -> Option<LogCallback>,
        G: Fn(&str) -> Option<ProgressCallback>,
    {
        let pending = queue.pending();
        let mut results = Vec::with_capacity(pending.len());

        for (i, id) in pending.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Queue processing cancelled at job {}/{}", i + 1, pending.len());
                break;
            }

            let Some(job) = queue.get_by_id_mut(id) else {
                continue;
            };
            job.mark_processing();
            let job = job.clone();
            queue.save_or_warn();

            tracing::info!("Processing job {}/{}: {}", i + 1, pending.len(), job.name);

            let result = self.process_job(
                &job,
                log_callback_factory(id),
                progress_callback_factory(id),
            );

            if let Some(entry) = queue.get_by_id_mut(id) {
                match (&result.output_path, &result.error) {
                    (Some(output), _) if result.success => entry.mark_done(output.clone()),
                    _ if result.cancelled => entry.mark_cancelled(),
                    (_, error) => entry.mark_failed(error.clone().unwrap_or_default()),
                }
            }
            queue.save_or_warn();

            results.push(result);
        }

        results
    }
}

fn remove_temp(path: &Path, logger: &JobLogger) {
    if !path.exists() {
        return;
    }
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = removed {
        logger.warn(&format!("Could not remove {}: {}", path.display(), e));
    }
}

fn remove_work_dir(dir: &Path, logger: Option<&JobLogger>) {
    if let Err(e) = fs::remove_dir_all(dir) {
        let message = format!("Could not remove work directory {}: {}", dir.display(), e);
        match logger {
            Some(logger) => logger.warn(&message),
            None => tracing::warn!("{}", message),
        }
    }
}
