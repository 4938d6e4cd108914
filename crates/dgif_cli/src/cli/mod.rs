use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use directories::ProjectDirs;

use dgif_core::config::{ConfigManager, Settings};
use dgif_core::logging::{init_tracing, init_tracing_with_file, LogLevel};

mod check;
mod config;
mod convert;
mod preview;
mod probe;

pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use convert::ConvertCommand;
pub use preview::PreviewCommand;
pub use probe::ProbeCommand;

#[derive(Parser, Debug)]
#[command(name = "discord-gifs", version)]
#[command(about = "Convert videos and images into size-limited Discord GIFs and APNGs")]
pub struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert one or more inputs into a Discord asset
    Convert(ConvertCommand),
    /// Show what ffprobe reports and which outputs need cropping
    Probe(ProbeCommand),
    /// Write the cropped intermediate next to the input and play it
    Preview(PreviewCommand),
    /// Report which external tools were found
    Check(CheckCommand),
    /// Show or create the config file
    Config(ConfigCommand),
}

impl Args {
    pub async fn run(self) -> Result<ExitCode> {
        let level = LogLevel::from_verbosity(self.verbose);
        let config_path = self.config.unwrap_or_else(default_config_path);

        let command = match self.command {
            Command::Config(cmd) => {
                init_tracing(level);
                return cmd.run(&config_path);
            }
            command => command,
        };

        let app = AppContext::load(&config_path);
        let _log_guard = match app.ensure_dirs() {
            Ok(()) => Some(init_tracing_with_file(level, &app.logs_dir)),
            Err(e) => {
                init_tracing(level);
                tracing::warn!("Failed to create directories: {}", e);
                None
            }
        };

        tracing::debug!("Config: {}", app.config_path.display());
        tracing::debug!("Core version: {}", dgif_core::version());

        match command {
            Command::Convert(cmd) => cmd.run(app, self.verbose > 0).await,
            Command::Probe(cmd) => cmd.run(&app),
            Command::Preview(cmd) => cmd.run(&app),
            Command::Check(cmd) => cmd.run(&app),
            Command::Config(cmd) => cmd.run(&config_path),
        }
    }
}

/// `<platform config dir>/settings.toml`, or `.config/settings.toml` when
/// the platform has no home directory.
fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "discord-gifs")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".config").join("settings.toml"))
}

/// Settings and resolved directories shared by the commands.
pub struct AppContext {
    pub config_path: PathBuf,
    pub settings: Settings,
    pub logs_dir: PathBuf,
    pub temp_root: PathBuf,
}

impl AppContext {
    /// Load (or create) the config. Falls back to defaults with a warning.
    ///
    /// Relative `temp_root` and `logs_folder` are taken relative to the
    /// config file's directory.
    pub fn load(config_path: &Path) -> Self {
        let mut manager = ConfigManager::new(config_path);
        if let Err(e) = manager.load_or_create() {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
        }

        let base = config_path.parent().unwrap_or(Path::new("."));
        let settings = manager.settings().clone();
        Self {
            config_path: config_path.to_path_buf(),
            logs_dir: relative_to(base, &settings.paths.logs_folder),
            temp_root: relative_to(base, &settings.paths.temp_root),
            settings,
        }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;
        std::fs::create_dir_all(&self.temp_root)
    }
}

fn relative_to(base: &Path, configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgif_core::models::OutputKind;

    #[test]
    fn parses_convert_with_globals() {
        let args = Args::try_parse_from([
            "discord-gifs",
            "-vv",
            "convert",
            "a.mp4",
            "b.gif",
            "--kind",
            "server-icon",
            "--fps",
            "24",
            "--config",
            "/tmp/c.toml",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        match args.command {
            Command::Convert(cmd) => {
                assert_eq!(cmd.inputs.len(), 2);
                assert_eq!(cmd.kind, OutputKind::ServerIcon);
                assert_eq!(cmd.fps, Some(24));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = Args::try_parse_from(["discord-gifs", "convert", "a.mp4", "--kind", "avatar"]);
        assert!(err.is_err());
    }

    #[test]
    fn convert_requires_input() {
        let err = Args::try_parse_from(["discord-gifs", "convert", "--kind", "emote"]);
        assert!(err.is_err());
    }

    #[test]
    fn parses_config_actions() {
        let args = Args::try_parse_from(["discord-gifs", "config", "init", "--force"]).unwrap();
        assert!(matches!(args.command, Command::Config(_)));
    }

    #[test]
    fn relative_dirs_follow_config_file() {
        let base = Path::new("/home/u/.config/discord-gifs");
        assert_eq!(relative_to(base, ".temp"), base.join(".temp"));
        assert_eq!(relative_to(base, "/var/tmp/dg"), PathBuf::from("/var/tmp/dg"));
    }
}
