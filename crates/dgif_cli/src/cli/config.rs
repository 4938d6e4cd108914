use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};

use dgif_core::config::ConfigManager;

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn run(self, config_path: &Path) -> Result<ExitCode> {
        match self.action {
            ConfigAction::Path => println!("{}", config_path.display()),
            ConfigAction::Show => print!("{}", show(config_path)?),
            ConfigAction::Init { force } => {
                init(config_path, force)?;
                println!("Wrote {}", config_path.display());
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Effective settings: the file when it exists, defaults otherwise.
fn show(config_path: &Path) -> Result<String> {
    let mut manager = ConfigManager::new(config_path);
    if config_path.exists() {
        manager
            .load()
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
    } else {
        tracing::info!("{} does not exist, showing defaults", config_path.display());
    }
    Ok(manager.render()?)
}

fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    ConfigManager::new(config_path)
        .save()
        .with_context(|| format!("Failed to write {}", config_path.display()))
}
