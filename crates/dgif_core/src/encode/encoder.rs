//! The size-fitting encode loop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::search::{EncodeTarget, WidthSearch};
use crate::logging::JobLogger;
use crate::models::{Container, EncoderBackend, OutputProfile};
use crate::naming::{available_name, format_size};
use crate::orchestrator::CancelHandle;
use crate::tools::{commands, Tool, ToolCommand, ToolError, ToolPaths, ToolRunner};

/// Errors from the encode loop.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Encoder produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("No frames found in {0}")]
    NoFrames(PathBuf),

    #[error("Cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl EncodeError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// What the encoder reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeSource {
    /// A video, GIF or still/animated PNG for the FFmpeg filter graph.
    Media(PathBuf),
    /// Ordered PNG frames for gifski.
    Frames(Vec<PathBuf>),
}

/// Final result of the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeOutcome {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub attempts: u32,
    /// Whether the last attempt is under the size limit.
    pub fits: bool,
    pub backend: EncoderBackend,
}

/// Runs encodes at different widths until the output lands in the band.
pub struct SizeFitEncoder<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    max_attempts: u32,
    cancel: Option<&'a CancelHandle>,
}

impl<'a> SizeFitEncoder<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths, max_attempts: u32) -> Self {
        Self {
            runner,
            tools,
            max_attempts: max_attempts.max(1),
            cancel: None,
        }
    }

    /// Check `handle` before every attempt.
    pub fn with_cancel_handle(mut self, handle: &'a CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Encode `source` into `output`, overwriting it on every attempt.
    pub fn encode(
        &self,
        source: &EncodeSource,
        target: &EncodeTarget,
        output: &Path,
        logger: &JobLogger,
    ) -> EncodeResult<EncodeOutcome> {
        let profile = &target.profile;
        let mut width = profile.initial_width;
        let mut height = profile.initial_height;
        let mut search = WidthSearch::new(width);
        let mut attempts = 0u32;

        let size = loop {
            if self.cancel.is_some_and(CancelHandle::is_cancelled) {
                logger.warn(&format!("Encode cancelled after {} attempts", attempts));
                return Err(EncodeError::Cancelled { attempts });
            }
            attempts += 1;

            let command = self.build_command(source, target, width, height, output)?;
            logger.command(&command.to_string());
            let result = self.runner.run(&command)?;
            for line in result.stderr_lines() {
                logger.output_line(line);
            }

            let size = fs::metadata(output)
                .map_err(|_| EncodeError::OutputMissing(output.to_path_buf()))?
                .len();
            logger.info(&format!(
                "Attempt {}: width {} -> {} (limit {})",
                attempts,
                width,
                format_size(size),
                format_size(profile.size_limit)
            ));
            logger.progress((attempts * 100 / self.max_attempts).min(99));

            if target.accepts(size, width) {
                break size;
            }
            if attempts >= self.max_attempts {
                logger.warn(&format!("Stopped after {} attempts", attempts));
                break size;
            }

            let next = search.next(size, profile.size_limit, |w| target.exceeds_source(w));
            if next == width {
                logger.debug(&format!("Width converged at {}", width));
                break size;
            }
            width = next;
            height = profile.height_for_width(width);
        };

        let fits = profile.fits(size);
        let height = match target.backend {
            EncoderBackend::Gifski => {
                let aspect = target.source_height as f64 / target.source_width.max(1) as f64;
                ((width as f64 * aspect).round() as u32).max(1)
            }
            EncoderBackend::Ffmpeg => height,
        };

        tracing::debug!(
            "Encoded {} at {}x{} in {} attempts ({} bytes)",
            output.display(),
            width,
            height,
            attempts,
            size
        );

        Ok(EncodeOutcome {
            output: output.to_path_buf(),
            width,
            height,
            size_bytes: size,
            attempts,
            fits,
            backend: target.backend,
        })
    }

    fn build_command(
        &self,
        source: &EncodeSource,
        target: &EncodeTarget,
        width: u32,
        height: u32,
        output: &Path,
    ) -> EncodeResult<ToolCommand> {
        let command = match (target.backend, source) {
            (EncoderBackend::Gifski, EncodeSource::Frames(frames)) => {
                let gifski = self.tools.require(Tool::Gifski)?;
                commands::gifski(gifski, frames, target.fps, width, output)
            }
            (_, EncodeSource::Media(input)) => match target.profile.container {
                Container::Gif => {
                    commands::gif_palette(&self.tools.ffmpeg, input, width, height, target.fps, output)
                }
                Container::Apng => {
                    commands::apng_palette(&self.tools.ffmpeg, input, width, height, target.fps, output)
                }
            },
            (EncoderBackend::Ffmpeg, EncodeSource::Frames(frames)) => {
                let dir = frames
                    .first()
                    .and_then(|f| f.parent())
                    .unwrap_or(Path::new("."));
                return Err(EncodeError::NoFrames(dir.to_path_buf()));
            }
        };
        Ok(command)
    }
}

/// Choose gifski only when the profile wants it, it is installed,
/// the user allows it, and the output is a GIF.
pub fn select_backend(profile: &OutputProfile, tools: &ToolPaths, prefer_gifski: bool) -> EncoderBackend {
    if profile.prefers_gifski
        && prefer_gifski
        && tools.gifski.is_some()
        && profile.container != Container::Apng
    {
        EncoderBackend::Gifski
    } else {
        EncoderBackend::Ffmpeg
    }
}

/// `<output_dir or input dir>/<input stem>.<gif|png>`, made unique.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>, profile: &OutputProfile) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    available_name(&dir.join(format!("{}.{}", stem, profile.extension())))
}

/// Extracted `frame*.png` files in a directory, in frame order.
pub fn collect_frames(dir: &Path) -> EncodeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| EncodeError::io(dir, e))?;

    let mut frames: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| n.starts_with("frame") && n.ends_with(".png"))
        })
        .collect();
    frames.sort();

    if frames.is_empty() {
        return Err(EncodeError::NoFrames(dir.to_path_buf()));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use crate::models::OutputKind;
    use crate::tools::fake::{touch, FakeRunner};
    use tempfile::tempdir;

    fn target(kind: OutputKind, w: u32, h: u32, backend: EncoderBackend) -> EncodeTarget {
        EncodeTarget {
            source_width: w,
            source_height: h,
            profile: OutputProfile::for_kind(kind),
            fps: 30,
            backend,
        }
    }

    #[test]
    fn lands_in_band() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path().join("logs"), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(1000, 1000);
        let tools = ToolPaths::bare();
        let encoder = SizeFitEncoder::new(&runner, &tools, 24);
        let outcome = encoder
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Emote, 1000, 1000, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.width, 246);
        assert_eq!(outcome.attempts, 8);
        assert_eq!(outcome.size_bytes, 246_000);
        assert!(outcome.fits);

        let widths: Vec<String> = runner
            .calls_for(Tool::Ffmpeg)
            .iter()
            .filter_map(|c| c.value_of("-filter_complex").map(|f| f.to_string()))
            .collect();
        assert!(widths[0].contains("scale=110:100"));
        assert!(widths[1].contains("scale=176:176"));
        assert!(widths[0].contains("fps=30"));
    }

    #[test]
    fn stops_when_source_bound() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path(), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(150, 150);
        let tools = ToolPaths::bare();
        let outcome = SizeFitEncoder::new(&runner, &tools, 24)
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Emote, 150, 150, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.width, 149);
        assert_eq!(outcome.attempts, 6);
        assert!(outcome.fits);
    }

    #[test]
    fn reports_oversize_without_failing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path(), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(1000, 1000).with_size_fn(|_| 10_000_000);
        let tools = ToolPaths::bare();
        let outcome = SizeFitEncoder::new(&runner, &tools, 24)
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Emote, 1000, 1000, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.width, 1);
        assert_eq!(outcome.attempts, 11);
        assert!(!outcome.fits);
    }

    /// Flips the cancel flag once the first encode has run.
    struct CancelAfterFirst {
        inner: FakeRunner,
        handle: CancelHandle,
    }

    impl ToolRunner for CancelAfterFirst {
        fn run(&self, command: &ToolCommand) -> crate::tools::ToolResult<crate::tools::ToolOutput> {
            let output = self.inner.run(command)?;
            self.handle.cancel();
            Ok(output)
        }
    }

    #[test]
    fn cancel_stops_before_next_attempt() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path(), LogConfig::default(), None).unwrap();

        let handle = CancelHandle::new();
        let runner = CancelAfterFirst {
            inner: FakeRunner::new(1000, 1000).with_size_fn(|_| 10_000_000),
            handle: handle.clone(),
        };
        let tools = ToolPaths::bare();
        let err = SizeFitEncoder::new(&runner, &tools, 24)
            .with_cancel_handle(&handle)
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Emote, 1000, 1000, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap_err();

        assert!(matches!(err, EncodeError::Cancelled { attempts: 1 }));
        assert_eq!(runner.inner.calls().len(), 1);
    }

    #[test]
    fn max_attempts_caps_the_loop() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path(), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(1000, 1000).with_size_fn(|_| 10_000_000);
        let tools = ToolPaths::bare();
        let outcome = SizeFitEncoder::new(&runner, &tools, 3)
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Emote, 1000, 1000, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn sticker_uses_apng_graph() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        touch(&input);
        let output = dir.path().join("out.png");
        let logger = JobLogger::new("t", dir.path(), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(1000, 1000).with_size_fn(|w| w as u64 * 2400);
        let tools = ToolPaths::bare();
        let outcome = SizeFitEncoder::new(&runner, &tools, 24)
            .encode(
                &EncodeSource::Media(input),
                &target(OutputKind::Sticker, 1000, 1000, EncoderBackend::Ffmpeg),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(runner.calls()[0].value_of("-f"), Some("apng"));
    }

    #[test]
    fn gifski_gets_width_only() {
        let dir = tempdir().unwrap();
        let frames = vec![dir.path().join("frame00001.png"), dir.path().join("frame00002.png")];
        for f in &frames {
            touch(f);
        }
        let output = dir.path().join("out.gif");
        let logger = JobLogger::new("t", dir.path().join("logs"), LogConfig::default(), None).unwrap();

        let runner = FakeRunner::new(1000, 1000).with_size_fn(|w| w as u64 * 15_000);
        let tools = ToolPaths::bare();
        let outcome = SizeFitEncoder::new(&runner, &tools, 24)
            .encode(
                &EncodeSource::Frames(frames),
                &target(OutputKind::Pfp, 1000, 1000, EncoderBackend::Gifski),
                &output,
                &logger,
            )
            .unwrap();

        assert_eq!(outcome.backend, EncoderBackend::Gifski);
        assert_eq!(outcome.width, 500);
        assert_eq!(outcome.height, 500);
        let call = &runner.calls_for(Tool::Gifski)[0];
        assert_eq!(call.value_of("--width"), Some("500"));
        assert!(!call.args.iter().any(|a| a == "--height"));
    }

    #[test]
    fn backend_selection() {
        let with_gifski = ToolPaths::bare();
        let without = ToolPaths {
            gifski: None,
            ..ToolPaths::bare()
        };
        let pfp = OutputProfile::for_kind(OutputKind::Pfp);
        let emote = OutputProfile::for_kind(OutputKind::Emote);
        let sticker = OutputProfile::for_kind(OutputKind::Sticker);

        assert_eq!(select_backend(&pfp, &with_gifski, true), EncoderBackend::Gifski);
        assert_eq!(select_backend(&pfp, &with_gifski, false), EncoderBackend::Ffmpeg);
        assert_eq!(select_backend(&pfp, &without, true), EncoderBackend::Ffmpeg);
        assert_eq!(select_backend(&emote, &with_gifski, true), EncoderBackend::Ffmpeg);
        assert_eq!(select_backend(&sticker, &with_gifski, true), EncoderBackend::Ffmpeg);
    }

    #[test]
    fn output_path_defaults_next_to_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        touch(&input);
        let sticker = OutputProfile::for_kind(OutputKind::Sticker);
        assert_eq!(output_path_for(&input, None, &sticker), dir.path().join("clip.png"));

        touch(&dir.path().join("clip.png"));
        assert_eq!(output_path_for(&input, None, &sticker), dir.path().join("clip(0).png"));

        let out_dir = dir.path().join("out");
        let emote = OutputProfile::for_kind(OutputKind::Emote);
        assert_eq!(output_path_for(&input, Some(&out_dir), &emote), out_dir.join("clip.gif"));
    }

    #[test]
    fn frames_are_sorted_and_required() {
        let dir = tempdir().unwrap();
        assert!(matches!(collect_frames(dir.path()), Err(EncodeError::NoFrames(_))));

        touch(&dir.path().join("frame00002.png"));
        touch(&dir.path().join("frame00001.png"));
        touch(&dir.path().join("notes.txt"));
        let frames = collect_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("frame00001.png"));
    }
}
