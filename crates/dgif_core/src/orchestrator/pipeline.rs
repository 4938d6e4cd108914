//! Pipeline runner that executes steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in order, running validation before
/// and after each step. Cancellation is checked at every step boundary.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
    /// Cancellation flag, possibly shared with a queue processor.
    cancel: CancelHandle,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancel: CancelHandle::new(),
        }
    }

    /// Use an existing cancellation flag instead of a private one.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Get a cancellation handle.
    ///
    /// Call `cancel()` on the returned handle to stop the pipeline
    /// at the next step boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step: check for cancellation, `validate_input`, `execute`,
    /// then `validate_output` if execute returned Success. On failure the
    /// tail of tool output is flushed to the log.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before step '{}'", step.name()));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let step_name = step.name();
            ctx.logger.phase(step.description());

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(step_name, percent, &format!("Starting {}", step_name));

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.clear_tail();
            let outcome = match step.execute(ctx, state) {
                Ok(outcome) => outcome,
                // A cancel request interrupts the running tool, which then fails.
                Err(e) if self.is_cancelled() => {
                    ctx.logger
                        .warn(&format!("{} stopped by cancel request: {}", step_name, e));
                    return Err(PipelineError::cancelled(&ctx.job_name));
                }
                Err(e) => {
                    ctx.logger.error(&format!("{} failed: {}", step_name, e));
                    ctx.logger.show_tail(step_name);
                    return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                }
            };

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running pipeline or queue.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Work stops at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::StepError;
    use crate::tools::fake::FakeRunner;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        skip: bool,
        fail: bool,
        /// Cancelled right before failing, like Ctrl-C reaching a child process.
        cancel: Option<CancelHandle>,
    }

    impl CountingStep {
        fn new(name: &'static str, count: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                execute_count: Arc::clone(count),
                skip: false,
                fail: false,
                cancel: None,
            }
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(&self, ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = &self.cancel {
                handle.cancel();
            }
            if self.fail {
                ctx.logger.output_line("Conversion failed!");
                return Err(StepError::command_failed("ffmpeg", 1, "Conversion failed!"));
            }
            if self.skip {
                return Ok(StepOutcome::Skipped("nothing to do".to_string()));
            }
            Ok(StepOutcome::Success)
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Step1", &count))
            .with_step(CountingStep::new("Step2", &count));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn runs_steps_and_records_skips() {
        let dir = tempdir().unwrap();
        let ctx = Context::for_test(dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let count = Arc::new(AtomicUsize::new(0));
        let mut skipping = CountingStep::new("Skipper", &count);
        skipping.skip = true;

        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("First", &count))
            .with_step(skipping)
            .with_step(CountingStep::new("Last", &count));

        let mut state = JobState::new("job");
        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(result.steps_completed, vec!["First", "Last"]);
        assert_eq!(result.steps_skipped, vec!["Skipper"]);
        assert_eq!(result.total_steps(), 3);
    }

    #[test]
    fn failure_stops_pipeline() {
        let dir = tempdir().unwrap();
        let ctx = Context::for_test(dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let count = Arc::new(AtomicUsize::new(0));
        let mut failing = CountingStep::new("Broken", &count);
        failing.fail = true;

        let pipeline = Pipeline::new()
            .with_step(failing)
            .with_step(CountingStep::new("Never", &count));

        let mut state = JobState::new("job");
        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("Broken"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn failure_after_cancel_request_counts_as_cancelled() {
        let dir = tempdir().unwrap();
        let ctx = Context::for_test(dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let count = Arc::new(AtomicUsize::new(0));
        let handle = CancelHandle::new();
        let mut interrupted = CountingStep::new("Encode", &count);
        interrupted.fail = true;
        interrupted.cancel = Some(handle.clone());

        let pipeline = Pipeline::new()
            .with_cancel_handle(handle)
            .with_step(interrupted)
            .with_step(CountingStep::new("Never", &count));

        let mut state = JobState::new("job");
        let err = pipeline.run(&ctx, &mut state).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_handle_works() {
        let pipeline = Pipeline::new();
        let handle = pipeline.cancel_handle();

        assert!(!pipeline.is_cancelled());
        handle.cancel();
        assert!(pipeline.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn shared_handle_cancels_before_first_step() {
        let dir = tempdir().unwrap();
        let ctx = Context::for_test(dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let count = Arc::new(AtomicUsize::new(0));
        let handle = CancelHandle::new();

        let pipeline = Pipeline::new()
            .with_cancel_handle(handle.clone())
            .with_step(CountingStep::new("Step", &count));
        handle.cancel();

        let mut state = JobState::new("job");
        let err = pipeline.run(&ctx, &mut state).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
