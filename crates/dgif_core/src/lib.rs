//! dgif core - backend logic for discord-gifs
//!
//! This crate contains all business logic with zero UI dependencies:
//! output profiles, media probing, encoder command construction, the
//! size-fitting encode loop, and the job queue/pipeline that ties them
//! together. It is used by the `discord-gifs` command-line tool.

pub mod config;
pub mod crop;
pub mod encode;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod probe;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
