//! The unit of work in a conversion pipeline.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One stage of turning an input into a size-limited asset.
///
/// For each step the pipeline calls `validate_input`, then `execute`, then
/// `validate_output` when `execute` returned `Success`. A step that does not
/// apply to the job (no PNG sequence to assemble, nothing to crop, ffmpeg
/// backend so no frames) returns `Skipped` with a reason instead of failing.
///
/// Steps read from the earlier sections of [`JobState`] and write their own
/// section once.
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs, progress and error chains ("Crop").
    fn name(&self) -> &str;

    /// Phase heading written to the job log.
    fn description(&self) -> &str {
        self.name()
    }

    /// Check what must hold before `execute`, such as the input existing.
    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Check the section `execute` recorded, such as its file being on disk.
    fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingSettings;
    use crate::jobs::ConversionJob;
    use crate::models::{CropMode, OutputKind};
    use crate::orchestrator::Pipeline;
    use crate::tools::fake::{touch, FakeRunner};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Only does anything for sticker jobs.
    struct StickerOnly;

    impl PipelineStep for StickerOnly {
        fn name(&self) -> &str {
            "StickerOnly"
        }

        fn execute(&self, ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            if ctx.job.kind != OutputKind::Sticker {
                return Ok(StepOutcome::Skipped(format!("{} output", ctx.job.kind)));
            }
            Ok(StepOutcome::Success)
        }
    }

    #[test]
    fn default_hooks_let_a_step_skip_or_complete() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new().with_step(StickerOnly);

        let emote = Context::for_test(dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let result = pipeline.run(&emote, &mut JobState::new("emote")).unwrap();
        assert_eq!(result.steps_skipped, vec!["StickerOnly"]);
        assert!(result.steps_completed.is_empty());

        let input = dir.path().join("wave.gif");
        touch(&input);
        let job = ConversionJob::new(input, OutputKind::Sticker, 30, CropMode::Auto, &EncodingSettings::default())
            .unwrap();
        let sticker = Context::for_job(job, dir.path(), Arc::new(FakeRunner::new(100, 100)));
        let result = pipeline.run(&sticker, &mut JobState::new("sticker")).unwrap();
        assert_eq!(result.steps_completed, vec!["StickerOnly"]);
        assert_eq!(StickerOnly.description(), "StickerOnly");
    }
}
