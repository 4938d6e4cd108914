//! Scripted stand-in for FFmpeg, ffprobe and gifski used by unit tests.
//!
//! Encodes write a sparse file whose length is a function of the requested
//! width; probes answer from a table of known files.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use regex::Regex;

use super::commands::FRAME_PATTERN;
use super::runner::ToolRunner;
use super::types::{Tool, ToolCommand, ToolError, ToolOutput, ToolResult};

/// What ffprobe reports for a file.
#[derive(Debug, Clone)]
pub(crate) struct FakeMedia {
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub frame_rate: String,
    pub duration: Option<f64>,
    pub has_video: bool,
}

impl FakeMedia {
    pub fn video(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            codec: "h264".to_string(),
            frame_rate: "30/1".to_string(),
            duration: Some(3.0),
            has_video: true,
        }
    }

    pub fn with_codec(mut self, codec: &str) -> Self {
        self.codec = codec.to_string();
        self
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    fn to_json(&self) -> String {
        if !self.has_video {
            return r#"{"streams": [], "format": {}}"#.to_string();
        }
        let duration = self
            .duration
            .map(|d| format!(r#", "duration": "{:.6}""#, d))
            .unwrap_or_default();
        format!(
            r#"{{"streams": [{{"codec_name": "{}", "width": {}, "height": {}, "r_frame_rate": "{}"{}}}], "format": {{}}}}"#,
            self.codec, self.width, self.height, self.frame_rate, duration
        )
    }
}

struct FakeState {
    media: HashMap<PathBuf, FakeMedia>,
    default_media: FakeMedia,
    calls: Vec<ToolCommand>,
    fail: Option<Tool>,
    frame_count: usize,
}

type SizeFn = Box<dyn Fn(u32) -> u64 + Send + Sync>;

pub(crate) struct FakeRunner {
    state: Mutex<FakeState>,
    size_for_width: SizeFn,
}

impl FakeRunner {
    /// Every unknown file probes as a `width`×`height` H.264 video.
    /// Encodes produce `width * 1000` bytes.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Mutex::new(FakeState {
                media: HashMap::new(),
                default_media: FakeMedia::video(width, height),
                calls: Vec::new(),
                fail: None,
                frame_count: 3,
            }),
            size_for_width: Box::new(|w| w as u64 * 1000),
        }
    }

    pub fn with_size_fn(mut self, f: impl Fn(u32) -> u64 + Send + Sync + 'static) -> Self {
        self.size_for_width = Box::new(f);
        self
    }

    pub fn with_media(self, path: impl Into<PathBuf>, media: FakeMedia) -> Self {
        self.state.lock().media.insert(path.into(), media);
        self
    }

    pub fn with_default_media(self, media: FakeMedia) -> Self {
        self.state.lock().default_media = media;
        self
    }

    pub fn without_video(self) -> Self {
        self.state.lock().default_media.has_video = false;
        self
    }

    pub fn failing(self, tool: Tool) -> Self {
        self.state.lock().fail = Some(tool);
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.state.lock().calls.clone()
    }

    pub fn calls_for(&self, tool: Tool) -> Vec<ToolCommand> {
        self.calls().into_iter().filter(|c| c.tool == tool).collect()
    }

    fn write_sized(path: &Path, size: u64) -> ToolResult<()> {
        let file = File::create(path).map_err(|e| spawn_error(Tool::Ffmpeg, e))?;
        file.set_len(size).map_err(|e| spawn_error(Tool::Ffmpeg, e))
    }

    fn encode_size(&self, filter: &str) -> u64 {
        let width = Regex::new(r"scale=(\d+):(\d+)")
            .ok()
            .and_then(|re| re.captures(filter).and_then(|c| c[1].parse().ok()))
            .unwrap_or(0);
        (self.size_for_width)(width)
    }

    fn run_ffmpeg(&self, command: &ToolCommand) -> ToolResult<()> {
        let output = PathBuf::from(command.output_arg().unwrap_or_default());

        if let Some(filter) = command
            .value_of("-filter_complex")
            .or_else(|| command.value_of("-vf").filter(|vf| vf.contains("palettegen")))
        {
            return Self::write_sized(&output, self.encode_size(filter));
        }

        if let Some(crop) = command.value_of("-filter:v") {
            let dims: Vec<u32> = crop
                .trim_start_matches("crop=")
                .split(':')
                .filter_map(|v| v.parse().ok())
                .collect();
            Self::write_sized(&output, 1024)?;
            if let [w, h, ..] = dims[..] {
                self.state.lock().media.insert(output, FakeMedia::video(w, h));
            }
            return Ok(());
        }

        if output.file_name().is_some_and(|n| n == FRAME_PATTERN) {
            let dir = output.parent().unwrap_or(Path::new("."));
            let count = self.state.lock().frame_count;
            for i in 1..=count {
                Self::write_sized(&dir.join(format!("frame{:05}.png", i)), 64)?;
            }
            return Ok(());
        }

        Self::write_sized(&output, 1024)
    }
}

fn spawn_error(tool: Tool, source: std::io::Error) -> ToolError {
    ToolError::SpawnFailed { tool, source }
}

impl ToolRunner for FakeRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<ToolOutput> {
        let fail = {
            let mut state = self.state.lock();
            state.calls.push(command.clone());
            state.fail
        };

        if fail == Some(command.tool) {
            return Err(ToolError::CommandFailed {
                tool: command.tool,
                exit_code: 1,
                message: "scripted failure".to_string(),
            });
        }

        match command.tool {
            Tool::Ffprobe => {
                let path = PathBuf::from(command.output_arg().unwrap_or_default());
                let state = self.state.lock();
                let media = state.media.get(&path).unwrap_or(&state.default_media);
                Ok(ToolOutput {
                    stdout: media.to_json(),
                    stderr: String::new(),
                })
            }
            Tool::Ffmpeg => {
                self.run_ffmpeg(command)?;
                Ok(ToolOutput {
                    stdout: String::new(),
                    stderr: "frame=  10 fps=0.0 q=-0.0 size=N/A".to_string(),
                })
            }
            Tool::Gifski => {
                let width = command
                    .value_of("--width")
                    .and_then(|w| w.parse().ok())
                    .unwrap_or(0);
                let output = PathBuf::from(command.value_of("-o").unwrap_or_default());
                Self::write_sized(&output, (self.size_for_width)(width))?;
                Ok(ToolOutput::default())
            }
            Tool::Ffplay => Ok(ToolOutput::default()),
        }
    }
}

/// Create a small stand-in input file.
pub(crate) fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"fake media").unwrap();
}
