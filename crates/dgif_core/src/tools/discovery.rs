//! Locating ffmpeg, ffprobe, gifski and ffplay.

use std::fmt;
use std::path::{Path, PathBuf};

use super::types::{Tool, ToolError, ToolResult};
use crate::config::ToolSettings;

/// Resolved executable paths.
///
/// FFmpeg and ffprobe are required; gifski and ffplay are optional extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub gifski: Option<PathBuf>,
    pub ffplay: Option<PathBuf>,
}

impl ToolPaths {
    /// Resolve every tool from the config, falling back to PATH.
    pub fn discover(settings: &ToolSettings) -> ToolResult<Self> {
        let ffmpeg =
            resolve(Tool::Ffmpeg, &settings.ffmpeg).ok_or(ToolError::not_found(Tool::Ffmpeg))?;
        let ffprobe =
            resolve(Tool::Ffprobe, &settings.ffprobe).ok_or(ToolError::not_found(Tool::Ffprobe))?;
        let gifski = resolve(Tool::Gifski, &settings.gifski);
        let ffplay = resolve(Tool::Ffplay, "");

        tracing::debug!(
            "Tools: ffmpeg={}, ffprobe={}, gifski={:?}, ffplay={:?}",
            ffmpeg.display(),
            ffprobe.display(),
            gifski,
            ffplay
        );

        Ok(Self {
            ffmpeg,
            ffprobe,
            gifski,
            ffplay,
        })
    }

    /// Paths that use bare binary names (resolved by the OS at spawn time).
    pub fn bare() -> Self {
        Self {
            ffmpeg: PathBuf::from(Tool::Ffmpeg.binary_name()),
            ffprobe: PathBuf::from(Tool::Ffprobe.binary_name()),
            gifski: Some(PathBuf::from(Tool::Gifski.binary_name())),
            ffplay: Some(PathBuf::from(Tool::Ffplay.binary_name())),
        }
    }

    /// Path for a tool, if it was found.
    pub fn path_for(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Ffmpeg => Some(&self.ffmpeg),
            Tool::Ffprobe => Some(&self.ffprobe),
            Tool::Gifski => self.gifski.as_deref(),
            Tool::Ffplay => self.ffplay.as_deref(),
        }
    }

    /// Path for a tool, or a `NotFound` error with an install hint.
    pub fn require(&self, tool: Tool) -> ToolResult<&Path> {
        self.path_for(tool).ok_or(ToolError::not_found(tool))
    }
}

/// Resolve one tool: explicit path, then configured name on PATH, then
/// the default binary name on PATH.
fn resolve(tool: Tool, configured: &str) -> Option<PathBuf> {
    let configured = configured.trim();
    if !configured.is_empty() {
        let path = PathBuf::from(configured);
        if path.is_file() {
            return Some(path);
        }
        if let Ok(found) = which::which(configured) {
            return Some(found);
        }
        tracing::warn!(
            "Configured {} path '{}' not found, searching PATH",
            tool,
            configured
        );
    }
    which::which(tool.binary_name()).ok()
}

/// One line of the dependency report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub tool: Tool,
    pub path: Option<PathBuf>,
    pub required: bool,
}

/// Which external tools are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    pub entries: Vec<DependencyStatus>,
}

impl DependencyReport {
    /// Probe every tool without failing on missing ones.
    pub fn collect(settings: &ToolSettings) -> Self {
        let entries = vec![
            DependencyStatus {
                tool: Tool::Ffmpeg,
                path: resolve(Tool::Ffmpeg, &settings.ffmpeg),
                required: true,
            },
            DependencyStatus {
                tool: Tool::Ffprobe,
                path: resolve(Tool::Ffprobe, &settings.ffprobe),
                required: true,
            },
            DependencyStatus {
                tool: Tool::Gifski,
                path: resolve(Tool::Gifski, &settings.gifski),
                required: false,
            },
            DependencyStatus {
                tool: Tool::Ffplay,
                path: resolve(Tool::Ffplay, ""),
                required: false,
            },
        ];
        Self { entries }
    }

    /// True when every required tool was found.
    pub fn all_required_found(&self) -> bool {
        self.entries
            .iter()
            .all(|e| !e.required || e.path.is_some())
    }

    /// Required tools that are missing.
    pub fn missing_required(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .filter(|e| e.required && e.path.is_none())
            .map(|e| e.tool)
            .collect()
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let kind = if entry.required { "required" } else { "optional" };
            match &entry.path {
                Some(path) => writeln!(f, "  [ok]      {:<8} {}", entry.tool, path.display())?,
                None => writeln!(
                    f,
                    "  [missing] {:<8} ({}) {}",
                    entry.tool,
                    kind,
                    entry.tool.install_hint()
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_file_path_wins() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("my-ffmpeg");
        std::fs::write(&fake, b"").unwrap();

        let found = resolve(Tool::Ffmpeg, fake.to_str().unwrap());
        assert_eq!(found, Some(fake));
    }

    #[test]
    fn require_reports_missing_optional() {
        let paths = ToolPaths {
            gifski: None,
            ..ToolPaths::bare()
        };
        assert!(paths.require(Tool::Ffmpeg).is_ok());
        assert!(matches!(
            paths.require(Tool::Gifski),
            Err(ToolError::NotFound { tool: Tool::Gifski, .. })
        ));
    }

    #[test]
    fn report_flags_missing_required() {
        let report = DependencyReport {
            entries: vec![
                DependencyStatus {
                    tool: Tool::Ffmpeg,
                    path: None,
                    required: true,
                },
                DependencyStatus {
                    tool: Tool::Gifski,
                    path: None,
                    required: false,
                },
            ],
        };
        assert!(!report.all_required_found());
        assert_eq!(report.missing_required(), vec![Tool::Ffmpeg]);
        assert!(report.to_string().contains("https://ffmpeg.org/"));
    }
}
