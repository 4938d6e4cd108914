//! Frames step - splits the source into PNG frames for gifski.

use std::fs;

use crate::encode::collect_frames;
use crate::models::EncoderBackend;
use crate::naming::available_name;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, FramesOutput, JobState, StepOutcome};
use crate::tools::commands;

pub struct FramesStep;

impl FramesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FramesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FramesStep {
    fn name(&self) -> &str {
        "Frames"
    }

    fn description(&self) -> &str {
        "Extract frames"
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if ctx.backend() != EncoderBackend::Gifski {
            return Ok(StepOutcome::Skipped("encoding with ffmpeg".to_string()));
        }

        let source = state
            .current_media()
            .map(|m| m.path.clone())
            .ok_or_else(|| StepError::precondition_failed("No source media recorded"))?;

        let dir = available_name(&ctx.work_dir.join("frames"));
        fs::create_dir_all(&dir)
            .map_err(|e| StepError::io_error(format!("creating {}", dir.display()), e))?;
        state.track_temp(&dir);

        ctx.run_tool(&commands::video_to_frames(&ctx.tools.ffmpeg, &source, ctx.job.fps, &dir))?;

        let frames = collect_frames(&dir)?;
        ctx.logger.info(&format!("Extracted {} frames at {} fps", frames.len(), ctx.job.fps));
        state.frames = Some(FramesOutput { dir, frames });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.frames {
            Some(out) if !out.frames.is_empty() => Ok(()),
            _ => Err(StepError::invalid_output("No frames extracted")),
        }
    }
}
