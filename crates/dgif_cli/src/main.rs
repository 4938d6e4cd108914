//! discord-gifs - convert videos and images into size-limited GIF/APNG
//! emotes, stickers, profile pictures, server icons and banners.
//!
//! Usage:
//!   discord-gifs convert clip.mp4 --kind emote
//!   discord-gifs probe clip.mp4
//!   discord-gifs check

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    cli::Args::parse().run().await
}
