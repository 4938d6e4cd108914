//! Conversion jobs and the job queue.
//!
//! This module provides:
//! - `ConversionJob`: one input, one output kind, with status and result
//! - `JobQueue`: ordered queue with persistence to the temp folder

mod queue;
mod types;

pub use queue::JobQueue;
pub use types::{ConversionJob, JobError, JobResult};
