//! File naming helpers: collision-free output names, PNG sequence
//! patterns and human-readable sizes.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Input extensions accepted for conversion (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: [&str; 13] = [
    "gif", "png", "mp4", "webm", "mkv", "avi", "mov", "wmv", "flv", "mpg", "mpeg", "m4v", "ts",
];

fn counter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)\((\d+)\)(.*)$").expect("counter regex should compile"))
}

fn frame_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,5})\.png$").expect("frame number regex should compile")
    })
}

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit regex should compile"))
}

/// Return a path that does not exist yet.
///
/// A free path is returned unchanged. Otherwise a `(n)` counter before the
/// extension is incremented, or `(0)` is inserted if there is none, until
/// the name is unused. An empty path becomes `temp`.
pub fn available_name(path: &Path) -> PathBuf {
    let mut candidate = if path.as_os_str().is_empty() {
        PathBuf::from("temp")
    } else {
        path.to_path_buf()
    };

    while candidate.exists() {
        candidate = next_name(&candidate);
    }
    candidate
}

/// One step of the counter: `a.gif` -> `a(0).gif`, `a(3).gif` -> `a(4).gif`.
fn next_name(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let renamed = match counter_regex().captures(&file_name) {
        Some(caps) => {
            let n: u64 = caps[2].parse().unwrap_or(0);
            format!("{}({}){}", &caps[1], n + 1, &caps[3])
        }
        None => match (path.file_stem(), path.extension()) {
            (Some(stem), Some(ext)) => {
                format!("{}(0).{}", stem.to_string_lossy(), ext.to_string_lossy())
            }
            _ => format!("{}(0)", file_name),
        },
    };

    path.with_file_name(renamed)
}

/// Swap the extension when `path` names an existing file.
pub fn with_extension_if_file(path: &Path, ext: &str) -> PathBuf {
    if path.is_file() {
        path.with_extension(ext.trim_start_matches('.'))
    } else {
        path.to_path_buf()
    }
}

/// Whether the extension is one we can convert.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a `.png` file name ends in a 1-5 digit frame number.
pub fn has_frame_number(path: &Path) -> bool {
    path.file_name()
        .map(|n| frame_number_regex().is_match(&n.to_string_lossy()))
        .unwrap_or(false)
}

/// printf-style input pattern for an FFmpeg image sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePattern {
    /// `dir/frame%04d.png`
    pub pattern: PathBuf,
    /// Number of the first frame.
    pub start_number: u32,
    /// Zero-padded width of the frame number.
    pub digits: usize,
    /// Suggested name for the assembled video (`dir/frame.mp4`).
    pub video_name: PathBuf,
}

impl SequencePattern {
    /// Build a pattern from the first frame of a sequence.
    ///
    /// Returns None if the file name contains no digits.
    pub fn from_first_frame(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let run = digit_run_regex().find(&file_name)?;

        let digits = run.len();
        let start_number = run.as_str().parse().ok()?;
        let pattern_name = format!(
            "{}%0{}d{}",
            &file_name[..run.start()],
            digits,
            &file_name[run.end()..]
        );

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        let base = if base.is_empty() { "sequence" } else { base };

        Some(Self {
            pattern: path.with_file_name(pattern_name),
            start_number,
            digits,
            video_name: path.with_file_name(format!("{}.mp4", base)),
        })
    }
}

/// Human-readable size: `"255.90KB"` below one megabyte, `"7.50MB"` above.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1_000_000 {
        format!("{:.2}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{:.2}MB", bytes as f64 / 1_000_000.0)
    }
}
