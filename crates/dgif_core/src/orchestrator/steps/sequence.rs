//! Sequence step - assembles a numbered PNG sequence into a video.
//!
//! The job input is the first frame; FFmpeg reads the rest through a
//! printf pattern starting at that frame's number.

use crate::models::InputKind;
use crate::naming::{available_name, SequencePattern};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, SequenceOutput, StepOutcome};
use crate::tools::commands;

pub struct SequenceStep;

impl SequenceStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SequenceStep {
    fn name(&self) -> &str {
        "Sequence"
    }

    fn description(&self) -> &str {
        "Assemble PNG sequence"
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let inspect = state
            .inspect
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Input was not inspected"))?;
        if inspect.input_kind != InputKind::PngSequence {
            return Ok(StepOutcome::Skipped("input is not a PNG sequence".to_string()));
        }

        let pattern = SequencePattern::from_first_frame(&ctx.job.input).ok_or_else(|| {
            StepError::invalid_input(format!(
                "{} has no frame number",
                ctx.job.input.display()
            ))
        })?;

        let video_name = pattern
            .video_name
            .file_name()
            .map(|n| ctx.work_dir.join(n))
            .unwrap_or_else(|| ctx.work_dir.join("sequence.mp4"));
        let video = available_name(&video_name);

        ctx.logger.info(&format!(
            "Assembling frames from {} (starting at {})",
            pattern.pattern.display(),
            pattern.start_number
        ));
        ctx.run_tool(&commands::sequence_to_video(
            &ctx.tools.ffmpeg,
            &pattern.pattern,
            pattern.start_number,
            ctx.job.fps,
            &video,
        ))?;
        state.track_temp(&video);

        let media = ctx.probe(&video)?;
        ctx.check_duration_limit(&media)?;
        state.sequence = Some(SequenceOutput {
            pattern: pattern.pattern,
            start_number: pattern.start_number,
            media,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.sequence {
            Some(seq) if seq.media.path.exists() => Ok(()),
            Some(seq) => Err(StepError::invalid_output(format!(
                "Assembled video missing: {}",
                seq.media.path.display()
            ))),
            None => Err(StepError::invalid_output("Sequence output not recorded")),
        }
    }
}
