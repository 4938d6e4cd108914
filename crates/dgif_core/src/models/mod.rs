//! Data models for discord-gifs.
//!
//! - Enums for output kinds, input kinds, crop modes and job status
//! - Per-kind output profiles (limits, aspect, starting frame size)

mod enums;
mod profile;

pub use enums::{
    Container, CropMode, EncoderBackend, InputKind, JobStatus, OutputKind, ParseKindError,
};
pub use profile::{OutputProfile, STICKER_MAX_DURATION_SECS};
