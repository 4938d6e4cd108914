//! Core enums used throughout the application.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming;

/// Target asset category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Emote,
    Pfp,
    ServerIcon,
    Banner,
    Sticker,
}

impl OutputKind {
    /// All kinds, in the order they are offered to the user.
    pub const ALL: [OutputKind; 5] = [
        OutputKind::Emote,
        OutputKind::Pfp,
        OutputKind::ServerIcon,
        OutputKind::Banner,
        OutputKind::Sticker,
    ];

    /// Human-readable name ("server icon", not "server-icon").
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Emote => "emote",
            OutputKind::Pfp => "pfp",
            OutputKind::ServerIcon => "server icon",
            OutputKind::Banner => "banner",
            OutputKind::Sticker => "sticker",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when an output kind string is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid output choice: '{0}' (expected one of: emote, pfp, server icon, banner, sticker)")]
pub struct ParseKindError(pub String);

impl FromStr for OutputKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "emote" => Ok(OutputKind::Emote),
            "pfp" => Ok(OutputKind::Pfp),
            "server icon" => Ok(OutputKind::ServerIcon),
            "banner" => Ok(OutputKind::Banner),
            "sticker" => Ok(OutputKind::Sticker),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Output container written by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Gif,
    Apng,
}

impl Container {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Gif => "gif",
            Container::Apng => "png",
        }
    }
}

/// Which external encoder produces the final asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderBackend {
    /// FFmpeg palettegen/paletteuse filter graph.
    Ffmpeg,
    /// Gifski over an extracted PNG frame directory.
    Gifski,
}

impl std::fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderBackend::Ffmpeg => write!(f, "ffmpeg"),
            EncoderBackend::Gifski => write!(f, "gifski"),
        }
    }
}

/// How a source whose aspect does not match the target is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Let the encoder scale (and distort) the source.
    Stretch,
    /// Crop evenly at the edges.
    #[default]
    Auto,
    /// Crop at the given offsets; a missing offset is centred.
    Manual { x: Option<u32>, y: Option<u32> },
}

impl std::fmt::Display for CropMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropMode::Stretch => write!(f, "stretch"),
            CropMode::Auto => write!(f, "auto"),
            CropMode::Manual { x, y } => {
                let fmt_axis = |v: &Option<u32>| v.map_or("center".to_string(), |n| n.to_string());
                write!(f, "manual (x={}, y={})", fmt_axis(x), fmt_axis(y))
            }
        }
    }
}

/// What kind of source the user handed us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Video,
    Gif,
    Png,
    Apng,
    /// First frame of a numbered PNG sequence.
    PngSequence,
}

impl InputKind {
    /// Classify an input from its path and the codec reported by ffprobe.
    pub fn classify(path: &Path, codec: &str) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "gif" => InputKind::Gif,
            "png" if codec == "apng" => InputKind::Apng,
            "png" if codec == "png" && naming::has_frame_number(path) => InputKind::PngSequence,
            "png" => InputKind::Png,
            _ => InputKind::Video,
        }
    }

    /// Whether the source carries its own frame rate worth reporting.
    pub fn has_source_fps(&self) -> bool {
        !matches!(self, InputKind::Png | InputKind::PngSequence)
    }

    /// Label used in probe output.
    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Video => "Video found",
            InputKind::Gif => "Gif found",
            InputKind::Png => "png found",
            InputKind::Apng => "apng found",
            InputKind::PngSequence => "png sequence found",
        }
    }
}

/// Status of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting to be processed.
    #[default]
    Queued,
    /// Currently running.
    Processing,
    /// Output written.
    Done,
    /// Job failed with an error.
    Failed,
    /// Queue processing was cancelled before or during this job.
    Cancelled,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_kind_parses_case_insensitive() {
        assert_eq!("Emote".parse::<OutputKind>(), Ok(OutputKind::Emote));
        assert_eq!(" PFP ".parse::<OutputKind>(), Ok(OutputKind::Pfp));
        assert_eq!("server icon".parse::<OutputKind>(), Ok(OutputKind::ServerIcon));
        assert_eq!("server-icon".parse::<OutputKind>(), Ok(OutputKind::ServerIcon));
        assert_eq!("server_icon".parse::<OutputKind>(), Ok(OutputKind::ServerIcon));
    }

    #[test]
    fn output_kind_rejects_unknown() {
        let err = "avatar".parse::<OutputKind>().unwrap_err();
        assert!(err.to_string().contains("avatar"));
        assert!(err.to_string().contains("server icon"));
    }

    #[test]
    fn output_kind_serializes_kebab() {
        let json = serde_json::to_string(&OutputKind::ServerIcon).unwrap();
        assert_eq!(json, "\"server-icon\"");
    }

    #[test]
    fn classifies_inputs() {
        assert_eq!(InputKind::classify(Path::new("a.gif"), "gif"), InputKind::Gif);
        assert_eq!(InputKind::classify(Path::new("a.PNG"), "apng"), InputKind::Apng);
        assert_eq!(
            InputKind::classify(Path::new("frame0001.png"), "png"),
            InputKind::PngSequence
        );
        assert_eq!(InputKind::classify(Path::new("logo.png"), "png"), InputKind::Png);
        assert_eq!(InputKind::classify(Path::new("clip.mp4"), "h264"), InputKind::Video);
    }

    #[test]
    fn crop_mode_from_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            crop: CropMode,
        }
        let parsed: Wrapper = toml::from_str("crop = \"stretch\"").unwrap();
        assert_eq!(parsed.crop, CropMode::Stretch);
    }

    #[test]
    fn finished_statuses() {
        assert!(!JobStatus::Queued.is_finished());
        assert!(!JobStatus::Processing.is_finished());
        assert!(JobStatus::Done.is_finished());
        assert!(JobStatus::Failed.is_finished());
    }
}
