//! Crop step - cuts the source to the output's aspect ratio.
//!
//! Auto mode centres the window; manual mode uses the job's offsets,
//! clamped to the source. Stretch mode leaves the source alone and lets
//! the encoder's scale filter distort it.

use crate::crop::CropGeometry;
use crate::models::CropMode;
use crate::naming::available_name;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, CropOutput, JobState, StepOutcome};
use crate::tools::commands;

pub struct CropStep;

impl CropStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CropStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CropStep {
    fn name(&self) -> &str {
        "Crop"
    }

    fn description(&self) -> &str {
        "Crop to target aspect"
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if ctx.job.crop == CropMode::Stretch {
            return Ok(StepOutcome::Skipped("stretch mode".to_string()));
        }

        let media = state
            .current_media()
            .ok_or_else(|| StepError::precondition_failed("No source media recorded"))?;

        let Some(geometry) = CropGeometry::for_target(media.width, media.height, &ctx.profile)
        else {
            return Ok(StepOutcome::Skipped("aspect already matches".to_string()));
        };
        let Some(window) = geometry.for_mode(ctx.job.crop) else {
            return Ok(StepOutcome::Skipped("stretch mode".to_string()));
        };

        let source = media.path.clone();
        let output = available_name(&ctx.work_dir.join(format!("{}_cropped.mp4", ctx.job_name)));

        ctx.logger.info(&format!(
            "Cropping {}x{} to {}x{} at ({}, {})",
            geometry.source_width, geometry.source_height, window.width, window.height, window.x, window.y
        ));
        ctx.run_tool(&commands::crop(
            &ctx.tools.ffmpeg,
            &source,
            window.width,
            window.height,
            window.x,
            window.y,
            &output,
        ))?;
        state.track_temp(&output);

        let media = ctx.probe(&output)?;
        if (media.width, media.height) != (window.width, window.height) {
            ctx.logger.warn(&format!(
                "Cropped file is {}x{}, expected {}x{}",
                media.width, media.height, window.width, window.height
            ));
        }
        state.crop = Some(CropOutput { window, media });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.crop {
            Some(crop) if crop.media.path.exists() => Ok(()),
            Some(crop) => Err(StepError::invalid_output(format!(
                "Cropped video missing: {}",
                crop.media.path.display()
            ))),
            None => Err(StepError::invalid_output("Crop output not recorded")),
        }
    }
}
