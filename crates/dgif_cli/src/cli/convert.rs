use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use tokio::signal;

use dgif_core::jobs::{ConversionJob, JobQueue};
use dgif_core::logging::LogCallback;
use dgif_core::models::{CropMode, OutputKind, OutputProfile};
use dgif_core::naming::format_size;
use dgif_core::orchestrator::{JobResult, ProgressCallback, QueueProcessor};
use dgif_core::tools::{SystemRunner, ToolPaths};

use super::AppContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CropArg {
    /// Centre the crop window
    Auto,
    /// Scale to the target aspect without cropping
    Stretch,
    /// Use --x / --y (missing axes are centred)
    Manual,
}

#[derive(Parser, Debug)]
pub struct ConvertCommand {
    /// Input videos, GIFs, PNGs or the first frame of a PNG sequence
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Output kind: emote, pfp, server-icon, banner, sticker
    #[arg(short, long)]
    pub kind: OutputKind,

    /// Frame rate (defaults to encoding.default_fps)
    #[arg(long)]
    pub fps: Option<u32>,

    /// How to fix a mismatched aspect ratio (defaults to encoding.default_crop)
    #[arg(long, value_enum)]
    pub crop: Option<CropArg>,

    /// Horizontal crop offset in pixels (implies --crop manual)
    #[arg(long)]
    pub x: Option<u32>,

    /// Vertical crop offset in pixels (implies --crop manual)
    #[arg(long)]
    pub y: Option<u32>,

    /// Write outputs here instead of next to each input
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also run jobs left queued by an interrupted run
    #[arg(long)]
    pub resume: bool,
}

impl ConvertCommand {
    fn crop_mode(&self, default: CropMode) -> CropMode {
        let manual = CropMode::Manual {
            x: self.x,
            y: self.y,
        };
        match self.crop {
            Some(CropArg::Auto) => CropMode::Auto,
            Some(CropArg::Stretch) => CropMode::Stretch,
            Some(CropArg::Manual) => manual,
            None if self.x.is_some() || self.y.is_some() => manual,
            None => default,
        }
    }

    pub async fn run(self, app: AppContext, verbose: bool) -> Result<ExitCode> {
        let settings = app.settings.clone();
        let limits = settings.limits.clone();
        let tools = ToolPaths::discover(&settings.tools).context("Cannot convert")?;

        let mut queue = JobQueue::new(&app.temp_root);
        queue.clear_finished();
        if !self.resume {
            for id in queue.pending() {
                queue.remove_by_id(&id);
            }
        } else if !queue.pending().is_empty() {
            println!("Resuming {} queued job(s)", queue.pending().len());
        }

        let fps = self.fps.unwrap_or(settings.encoding.default_fps);
        let crop = self.crop_mode(settings.encoding.default_crop);
        let mut failed = false;

        for input in &self.inputs {
            match ConversionJob::new(input, self.kind, fps, crop, &settings.encoding) {
                Ok(job) => queue.add(job.with_output_dir(self.output_dir.clone())),
                Err(e) => {
                    eprintln!("Skipping {}: {}", input.display(), e);
                    failed = true;
                }
            }
        }
        queue.save_or_warn();

        if queue.pending().is_empty() {
            return Ok(ExitCode::FAILURE);
        }

        let names: Arc<HashMap<String, String>> = Arc::new(
            queue
                .jobs()
                .iter()
                .map(|j| (j.id.clone(), j.name.clone()))
                .collect(),
        );

        let processor = QueueProcessor::new(
            settings,
            tools,
            Arc::new(SystemRunner),
            app.logs_dir.clone(),
            app.temp_root.clone(),
        );

        let cancel = processor.cancel_handle();
        let ctrl_c = tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling after the current step...");
                cancel.cancel();
            }
        });

        let progress_names = Arc::clone(&names);
        let (queue, results) = tokio::task::spawn_blocking(move || {
            let results = processor.process_queue(
                &mut queue,
                |_| log_callback(verbose),
                |id| progress_callback(&progress_names, id),
            );
            (queue, results)
        })
        .await
        .context("Job runner stopped unexpectedly")?;
        ctrl_c.abort();

        for result in &results {
            let name = names.get(&result.job_id).map(String::as_str).unwrap_or("?");
            let kind = queue
                .get_by_id(&result.job_id)
                .map(|j| j.kind)
                .unwrap_or(self.kind);
            failed |= !report(name, &OutputProfile::resolve(kind, &limits), result);
        }

        let left = queue.pending().len();
        if left > 0 {
            println!("{} job(s) still queued; run again with --resume to continue", left);
            failed = true;
        }

        Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

/// Job log lines go to stderr with -v; the log file always has them.
fn log_callback(verbose: bool) -> Option<LogCallback> {
    if !verbose {
        return None;
    }
    Some(Box::new(|line: &str| eprintln!("{}", line)))
}

fn progress_callback(names: &Arc<HashMap<String, String>>, id: &str) -> Option<ProgressCallback> {
    let name = names.get(id).cloned().unwrap_or_default();
    Some(Box::new(move |step: &str, percent: u32, _message: &str| {
        if percent < 100 {
            eprintln!("[{}] {} ({}%)", name, step, percent);
        }
    }))
}

/// Print one job's outcome. Returns false when the job failed or was cancelled.
fn report(name: &str, profile: &OutputProfile, result: &JobResult) -> bool {
    match (&result.output_path, result.size_bytes) {
        (Some(path), Some(size)) if result.success => {
            println!("Created {} ({})", path.display(), format_size(size));
            if !result.fits {
                println!(
                    "Warning: {} is still over the {} limit for a {}",
                    path.display(),
                    format_size(profile.size_limit),
                    profile.kind
                );
            }
            true
        }
        _ if result.cancelled => {
            println!("Cancelled {}", name);
            false
        }
        _ => {
            println!(
                "Failed {}: {}",
                name,
                result.error.as_deref().unwrap_or("unknown error")
            );
            false
        }
    }
}
