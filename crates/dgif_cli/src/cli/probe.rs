use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;

use dgif_core::crop::{ratio_label, CropGeometry};
use dgif_core::models::{InputKind, OutputKind, OutputProfile};
use dgif_core::probe::{probe_media, MediaInfo};
use dgif_core::tools::{SystemRunner, ToolPaths};

use super::AppContext;

#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// File to inspect
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

impl ProbeCommand {
    pub fn run(self, app: &AppContext) -> Result<ExitCode> {
        let tools = ToolPaths::discover(&app.settings.tools).context("Cannot probe")?;
        let media = probe_media(&SystemRunner, &tools, &self.input)
            .with_context(|| format!("Failed to probe {}", self.input.display()))?;
        let kind = InputKind::classify(&self.input, &media.codec);

        print!("{}", describe(&media, kind));
        println!();
        println!("Outputs:");
        for output in OutputKind::ALL {
            let profile = OutputProfile::resolve(output, &app.settings.limits);
            println!("  {}", crop_summary(&media, &profile));
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn describe(media: &MediaInfo, kind: InputKind) -> String {
    let mut out = format!("{}: {}\n", kind.label(), media.path.display());
    out.push_str(&format!("  Size:     {}x{}\n", media.width, media.height));
    out.push_str(&format!("  Codec:    {}\n", media.codec));
    if kind.has_source_fps() {
        match media.fps {
            Some(fps) => out.push_str(&format!("  FPS:      {}\n", fps)),
            None => out.push_str("  FPS:      unknown\n"),
        }
    }
    if let Some(duration) = media.duration_secs {
        out.push_str(&format!("  Duration: {:.2}s\n", duration));
    }
    out
}

fn crop_summary(media: &MediaInfo, profile: &OutputProfile) -> String {
    let label = format!("{:<12} {:<5}", profile.kind.label(), ratio_label(profile));
    let mut line = match CropGeometry::for_target(media.width, media.height, profile) {
        None => format!("{} no crop needed", label),
        Some(geometry) => {
            let window = geometry.centered();
            let (max_x, max_y) = geometry.max_offset();
            format!(
                "{} crop to {}x{} (x 0-{}, y 0-{})",
                label, window.width, window.height, max_x, max_y
            )
        }
    };
    if let (Some(max), Some(duration)) = (profile.max_duration_secs, media.duration_secs) {
        if duration >= max {
            line.push_str(&format!(", too long ({:.2}s, max {}s)", duration, max));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(w: u32, h: u32, duration: Option<f64>) -> MediaInfo {
        MediaInfo {
            path: PathBuf::from("clip.mp4"),
            width: w,
            height: h,
            codec: "h264".to_string(),
            fps: Some(29.97),
            duration_secs: duration,
        }
    }

    #[test]
    fn summary_shows_crop_window() {
        let profile = OutputProfile::for_kind(OutputKind::Pfp);
        let line = crop_summary(&media(1920, 1080, Some(2.0)), &profile);
        assert!(line.contains("1:1"));
        assert!(line.contains("crop to 1080x1080"));
        assert!(line.contains("x 0-840"));
    }

    #[test]
    fn summary_flags_long_sticker() {
        let profile = OutputProfile::for_kind(OutputKind::Sticker);
        let line = crop_summary(&media(320, 320, Some(7.5)), &profile);
        assert!(line.contains("no crop needed"));
        assert!(line.contains("too long"));
    }

    #[test]
    fn describe_hides_fps_for_still_png() {
        let info = media(64, 64, None);
        let text = describe(&info, InputKind::Png);
        assert!(text.starts_with("png found"));
        assert!(!text.contains("FPS"));

        let text = describe(&info, InputKind::Video);
        assert!(text.contains("FPS:      29.97"));
    }
}
