//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{CropMode, OutputKind};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Encoding defaults and bounds.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Per-kind byte limit overrides.
    #[serde(default)]
    pub limits: LimitSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for encoded assets. Empty writes next to the input.
    #[serde(default)]
    pub output_folder: String,

    /// Root folder for per-job working directories.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: String::new(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    /// Output folder, if one is configured.
    pub fn output_dir(&self) -> Option<PathBuf> {
        if self.output_folder.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.output_folder))
        }
    }
}

/// Locations of external binaries. Empty means search PATH.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub ffmpeg: String,

    #[serde(default)]
    pub ffprobe: String,

    #[serde(default)]
    pub gifski: String,

    /// Use gifski for pfp/server icon/banner when it is installed.
    #[serde(default = "default_true")]
    pub prefer_gifski: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: String::new(),
            ffprobe: String::new(),
            gifski: String::new(),
            prefer_gifski: true,
        }
    }
}

/// Encoding defaults and bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// FPS used when none is given.
    #[serde(default = "default_fps")]
    pub default_fps: u32,

    #[serde(default = "default_min_fps")]
    pub min_fps: u32,

    #[serde(default = "default_max_fps")]
    pub max_fps: u32,

    /// Upper bound on encode attempts per job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Keep intermediate files and work directories after a job.
    #[serde(default)]
    pub keep_temp_files: bool,

    /// Crop behaviour when none is given.
    #[serde(default)]
    pub default_crop: CropMode,
}

fn default_true() -> bool {
    true
}

fn default_fps() -> u32 {
    30
}

fn default_min_fps() -> u32 {
    10
}

fn default_max_fps() -> u32 {
    50
}

fn default_max_attempts() -> u32 {
    24
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
            min_fps: default_min_fps(),
            max_fps: default_max_fps(),
            max_attempts: default_max_attempts(),
            keep_temp_files: false,
            default_crop: CropMode::default(),
        }
    }
}

impl EncodingSettings {
    /// Whether an fps value is inside the configured bounds.
    pub fn fps_in_range(&self, fps: u32) -> bool {
        (self.min_fps..=self.max_fps).contains(&fps)
    }
}

/// Byte limit overrides. Zero keeps the built-in limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitSettings {
    #[serde(default)]
    pub emote: u64,

    #[serde(default)]
    pub sticker: u64,

    #[serde(default)]
    pub pfp: u64,

    #[serde(default)]
    pub server_icon: u64,

    #[serde(default)]
    pub banner: u64,
}

impl LimitSettings {
    /// Configured override for a kind, if any.
    pub fn override_for(&self, kind: OutputKind) -> Option<u64> {
        let value = match kind {
            OutputKind::Emote => self.emote,
            OutputKind::Sticker => self.sticker,
            OutputKind::Pfp => self.pfp,
            OutputKind::ServerIcon => self.server_icon,
            OutputKind::Banner => self.banner,
        };
        (value > 0).then_some(value)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of encoder output lines to show on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Echo every external command before running it.
    #[serde(default = "default_true")]
    pub show_commands: bool,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_commands: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Tools,
    Encoding,
    Limits,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Tools,
        ConfigSection::Encoding,
        ConfigSection::Limits,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Tools => "tools",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Limits => "limits",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and working directories",
            ConfigSection::Tools => "External encoders (empty = search PATH)",
            ConfigSection::Encoding => "Encoding defaults",
            ConfigSection::Limits => "Byte limit overrides per output kind (0 = built-in)",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
