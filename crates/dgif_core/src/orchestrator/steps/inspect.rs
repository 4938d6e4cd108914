//! Inspect step - probes the input and classifies it.
//!
//! Records dimensions, codec, frame rate and duration of the input, and
//! rejects inputs the chosen output kind cannot take (stickers longer
//! than the platform allows).

use crate::models::InputKind;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, InspectOutput, JobState, StepOutcome};

/// Probe step run before anything else.
pub struct InspectStep;

impl InspectStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InspectStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for InspectStep {
    fn name(&self) -> &str {
        "Inspect"
    }

    fn description(&self) -> &str {
        "Inspect input"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.job.input.is_file() {
            return Err(StepError::file_not_found(ctx.job.input.display().to_string()));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let media = ctx.probe(&ctx.job.input)?;
        let input_kind = InputKind::classify(&ctx.job.input, &media.codec);

        ctx.logger.info(&format!(
            "{}: {}x{} {}",
            input_kind.label(),
            media.width,
            media.height,
            media.codec
        ));
        if input_kind.has_source_fps() {
            if let Some(fps) = media.fps {
                ctx.logger.info(&format!("Source fps: {}", fps));
            }
        }

        // A sequence's first frame has no duration; Sequence checks the assembled video.
        if input_kind != InputKind::PngSequence {
            ctx.check_duration_limit(&media)?;
        }

        state.inspect = Some(InspectOutput { media, input_kind });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.inspect.is_none() {
            return Err(StepError::invalid_output("Media info not recorded"));
        }
        Ok(())
    }
}
