//! Media probing using ffprobe JSON output.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::{commands, ToolError, ToolPaths, ToolRunner};

/// Errors from probing a media file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No video stream in {0}")]
    NoVideoStream(PathBuf),

    #[error("Invalid dimensions {width}x{height} in {path}")]
    InvalidDimensions {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Facts about the first video stream of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// ffprobe codec name (`h264`, `gif`, `png`, `apng`, ...).
    pub codec: String,
    /// Frame rate rounded to three decimals.
    pub fps: Option<f64>,
    pub duration_secs: Option<f64>,
}

impl MediaInfo {
    /// Aspect as height / width.
    pub fn aspect(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a file's first video stream.
pub fn probe_media(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    path: &Path,
) -> ProbeResult<MediaInfo> {
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    tracing::debug!("Probing file: {}", path.display());

    let output = runner.run(&commands::probe(&tools.ffprobe, path))?;
    parse_probe_json(&output.stdout, path)
}

fn parse_probe_json(json: &str, path: &Path) -> ProbeResult<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NoVideoStream(path.to_path_buf()))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidDimensions {
            path: path.to_path_buf(),
            width,
            height,
        });
    }

    let duration_secs = stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| {
            parsed
                .format
                .and_then(|f| f.duration)
                .as_deref()
                .and_then(parse_seconds)
        });

    Ok(MediaInfo {
        path: path.to_path_buf(),
        width,
        height,
        codec: stream.codec_name.unwrap_or_default(),
        fps: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
        duration_secs,
    })
}

/// Parse `"num/den"` into frames per second, rounded to three decimals.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num == 0.0 {
        return None;
    }
    Some(((num / den) * 1000.0).round() / 1000.0)
}

fn parse_seconds(value: &str) -> Option<f64> {
    value.trim().parse().ok().filter(|d: &f64| d.is_finite())
}
