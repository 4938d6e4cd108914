//! Encode step - runs the size-fitting encoder and writes the final asset.

use std::fs;

use crate::encode::{output_path_for, EncodeSource, EncodeTarget, SizeFitEncoder};
use crate::models::EncoderBackend;
use crate::naming::format_size;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct EncodeStep;

impl EncodeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EncodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EncodeStep {
    fn name(&self) -> &str {
        "Encode"
    }

    fn description(&self) -> &str {
        "Encode to size limit"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if let Some(dir) = ctx.output_dir() {
            if dir.exists() && !dir.is_dir() {
                return Err(StepError::invalid_input(format!(
                    "Output folder is not a directory: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let media = state
            .current_media()
            .ok_or_else(|| StepError::precondition_failed("No source media recorded"))?;

        let backend = ctx.backend();
        let target = EncodeTarget {
            source_width: media.width,
            source_height: media.height,
            profile: ctx.profile,
            fps: ctx.job.fps,
            backend,
        };
        let source = match (backend, &state.frames) {
            (EncoderBackend::Gifski, Some(frames)) => EncodeSource::Frames(frames.frames.clone()),
            (EncoderBackend::Gifski, None) => {
                return Err(StepError::precondition_failed("Frames were not extracted"))
            }
            (EncoderBackend::Ffmpeg, _) => EncodeSource::Media(media.path.clone()),
        };

        let output_dir = ctx.output_dir();
        if let Some(dir) = &output_dir {
            fs::create_dir_all(dir)
                .map_err(|e| StepError::io_error(format!("creating {}", dir.display()), e))?;
        }
        let output = output_path_for(&ctx.job.input, output_dir.as_deref(), &ctx.profile);

        ctx.logger.info(&format!(
            "Encoding {} with {} (limit {})",
            ctx.profile.kind,
            backend,
            format_size(ctx.profile.size_limit)
        ));

        let encoder = SizeFitEncoder::new(
            ctx.runner.as_ref(),
            &ctx.tools,
            ctx.settings.encoding.max_attempts,
        )
        .with_cancel_handle(ctx.cancel_handle());
        let outcome = encoder.encode(&source, &target, &output, &ctx.logger)?;

        if outcome.fits {
            ctx.logger.success(&format!(
                "{} ({}x{}, {})",
                outcome.output.display(),
                outcome.width,
                outcome.height,
                format_size(outcome.size_bytes)
            ));
        } else {
            ctx.logger.warn(&format!(
                "Could not get {} under {} (smallest attempt {})",
                outcome.output.display(),
                format_size(ctx.profile.size_limit),
                format_size(outcome.size_bytes)
            ));
        }

        state.encode = Some(outcome);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.encode {
            Some(outcome) if outcome.output.is_file() => Ok(()),
            Some(outcome) => Err(StepError::invalid_output(format!(
                "Encoded file missing: {}",
                outcome.output.display()
            ))),
            None => Err(StepError::invalid_output("Encode result not recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingSettings;
    use crate::jobs::ConversionJob;
    use crate::models::{CropMode, OutputKind};
    use crate::orchestrator::steps::{FramesStep, InspectStep};
    use crate::tools::fake::{touch, FakeRunner};
    use crate::tools::Tool;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn encodes_emote_next_to_input() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(1000, 1000));
        let ctx = Context::for_test(dir.path(), runner);
        let mut state = JobState::new("job");

        InspectStep::new().execute(&ctx, &mut state).unwrap();
        EncodeStep::new().execute(&ctx, &mut state).unwrap();
        EncodeStep::new().validate_output(&ctx, &state).unwrap();

        let outcome = state.encode.unwrap();
        assert_eq!(outcome.output, dir.path().join("clip.gif"));
        assert_eq!(outcome.width, 246);
        assert_eq!(outcome.backend, EncoderBackend::Ffmpeg);
        assert!(outcome.fits);
    }

    #[test]
    fn gifski_reads_extracted_frames_into_output_dir() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("avatar.mp4");
        touch(&input);
        let out_dir = dir.path().join("out");
        let job = ConversionJob::new(input, OutputKind::Pfp, 30, CropMode::Auto, &EncodingSettings::default())
            .unwrap()
            .with_output_dir(Some(out_dir.clone()));
        let runner = Arc::new(FakeRunner::new(1000, 1000).with_size_fn(|w| w as u64 * 15_000));
        let ctx = Context::for_job(job, dir.path(), runner.clone());
        let mut state = JobState::new("job");

        InspectStep::new().execute(&ctx, &mut state).unwrap();
        FramesStep::new().execute(&ctx, &mut state).unwrap();
        EncodeStep::new().execute(&ctx, &mut state).unwrap();

        let outcome = state.encode.unwrap();
        assert_eq!(outcome.output, out_dir.join("avatar.gif"));
        assert_eq!(outcome.backend, EncoderBackend::Gifski);
        assert_eq!(outcome.attempts, 1);

        let gifski = runner.calls_for(Tool::Gifski);
        assert_eq!(gifski.len(), 1);
        assert!(gifski[0].args.iter().any(|a| a.ends_with("frame00003.png")));
    }

    #[test]
    fn gifski_without_frames_is_a_precondition_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("banner.mp4");
        touch(&input);
        let job = ConversionJob::new(input, OutputKind::Banner, 30, CropMode::Auto, &EncodingSettings::default())
            .unwrap();
        let ctx = Context::for_job(job, dir.path(), Arc::new(FakeRunner::new(1000, 400)));
        let mut state = JobState::new("job");

        InspectStep::new().execute(&ctx, &mut state).unwrap();
        let err = EncodeStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }
}
