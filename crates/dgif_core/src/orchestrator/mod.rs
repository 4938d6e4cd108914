//! Pipeline orchestrator for coordinating job execution.
//!
//! Each conversion job runs as a sequence of steps that validate,
//! execute, and record their results in a shared `JobState`.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Inspect   (probe, classify, sticker duration check)
//!     ├── Step: Sequence  (PNG sequence -> lossless video)
//!     ├── Step: Crop      (match the output aspect)
//!     ├── Step: Frames    (PNG frames for gifski)
//!     └── Step: Encode    (size-fitting encode)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dgif_core::orchestrator::{create_standard_pipeline, Context, JobState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(job, settings, tools, runner, work_dir, logger);
//! let mut state = JobState::new(&ctx.job.id);
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod queue_processor;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use queue_processor::{JobResult, QueueProcessor};
pub use step::PipelineStep;
pub use steps::{CropStep, EncodeStep, FramesStep, InspectStep, SequenceStep};
pub use types::{
    Context, CropOutput, FramesOutput, InspectOutput, JobState, ProgressCallback, SequenceOutput,
    StepOutcome,
};

/// Create a standard pipeline with all steps in the correct order.
///
/// 1. Inspect - probe and classify the input
/// 2. Sequence - assemble a PNG sequence (skipped otherwise)
/// 3. Crop - crop to the output aspect (skipped when it matches or in stretch mode)
/// 4. Frames - extract frames (gifski backend only)
/// 5. Encode - shrink until the output fits the size limit
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(InspectStep::new())
        .with_step(SequenceStep::new())
        .with_step(CropStep::new())
        .with_step(FramesStep::new())
        .with_step(EncodeStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Inspect", "Sequence", "Crop", "Frames", "Encode"]
        );
    }
}
