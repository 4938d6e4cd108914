use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;

use dgif_core::crop::{ratio_label, CropGeometry, CropWindow};
use dgif_core::models::{OutputKind, OutputProfile};
use dgif_core::naming::available_name;
use dgif_core::probe::probe_media;
use dgif_core::tools::{commands, SystemRunner, ToolPaths, ToolRunner};

use super::AppContext;

#[derive(Parser, Debug)]
pub struct PreviewCommand {
    /// File to crop
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output kind whose aspect ratio to crop to
    #[arg(short, long)]
    pub kind: OutputKind,

    /// Horizontal crop offset in pixels (centred when omitted)
    #[arg(long)]
    pub x: Option<u32>,

    /// Vertical crop offset in pixels (centred when omitted)
    #[arg(long)]
    pub y: Option<u32>,

    /// Only write the cropped file, do not open ffplay
    #[arg(long)]
    pub no_play: bool,
}

impl PreviewCommand {
    pub fn run(self, app: &AppContext) -> Result<ExitCode> {
        let tools = ToolPaths::discover(&app.settings.tools).context("Cannot preview")?;
        let runner = SystemRunner;
        let media = probe_media(&runner, &tools, &self.input)
            .with_context(|| format!("Failed to probe {}", self.input.display()))?;
        let profile = OutputProfile::resolve(self.kind, &app.settings.limits);

        let Some(geometry) = CropGeometry::for_target(media.width, media.height, &profile) else {
            println!(
                "{} is already {} ({}x{}); no crop needed",
                self.input.display(),
                ratio_label(&profile),
                media.width,
                media.height
            );
            return Ok(ExitCode::SUCCESS);
        };

        let window = geometry.with_offsets(self.x, self.y);
        let (max_x, max_y) = geometry.max_offset();
        let output = preview_path(&self.input);

        runner
            .run(&commands::crop(
                &tools.ffmpeg,
                &self.input,
                window.width,
                window.height,
                window.x,
                window.y,
                &output,
            ))
            .context("Crop failed")?;

        println!("{}", describe_window(&window, max_x, max_y));
        println!("Preview written to {}", output.display());

        if self.no_play {
            return Ok(ExitCode::SUCCESS);
        }
        match &tools.ffplay {
            Some(ffplay) => {
                runner
                    .run(&commands::ffplay_preview(ffplay, &output))
                    .context("ffplay failed")?;
            }
            None => println!("ffplay not found; open the file in any player"),
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// `<dir>/<stem>_cropped.mp4` next to the input, made unique.
fn preview_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string());
    available_name(&input.with_file_name(format!("{}_cropped.mp4", stem)))
}

fn describe_window(window: &CropWindow, max_x: u32, max_y: u32) -> String {
    format!(
        "Crop {}x{} at x={} (0-{}), y={} (0-{})",
        window.width, window.height, window.x, max_x, window.y, max_y
    )
}
