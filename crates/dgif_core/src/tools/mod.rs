//! External tool integration: discovery, argument building and execution.
//!
//! Every FFmpeg, ffprobe, gifski and ffplay invocation goes through a
//! [`ToolRunner`], so the rest of the crate never spawns processes directly.

pub mod commands;
mod discovery;
mod runner;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use discovery::{DependencyReport, DependencyStatus, ToolPaths};
pub use runner::{SystemRunner, ToolRunner};
pub use types::{Tool, ToolCommand, ToolError, ToolOutput, ToolResult};
