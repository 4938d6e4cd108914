//! Job queue state management with persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{ConversionJob, JobResult};
use crate::models::JobStatus;

/// Persistent queue state (saved to queue.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueState {
    /// Queue format version.
    version: u32,
    /// Jobs in queue order.
    jobs: Vec<ConversionJob>,
}

/// Ordered list of conversion jobs, optionally persisted to the temp folder.
#[derive(Debug)]
pub struct JobQueue {
    /// Jobs in queue order.
    jobs: Vec<ConversionJob>,
    /// Path to queue.json; empty for an in-memory queue.
    queue_file: PathBuf,
}

impl JobQueue {
    /// Create a queue persisted to `<temp_root>/queue.json`, loading any saved jobs.
    ///
    /// An unreadable or corrupt file yields an empty queue. Jobs a crashed
    /// run left in `Processing` are queued again.
    pub fn new(temp_root: &Path) -> Self {
        let queue_file = temp_root.join("queue.json");

        let mut jobs = if queue_file.exists() {
            match fs::read_to_string(&queue_file) {
                Ok(content) => match serde_json::from_str::<QueueState>(&content) {
                    Ok(state) => {
                        tracing::info!("Loaded {} jobs from queue.json", state.jobs.len());
                        state.jobs
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse queue.json: {}", e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read queue.json: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        for job in jobs.iter_mut().filter(|j| j.status == JobStatus::Processing) {
            tracing::warn!("Job '{}' was interrupted; queuing it again", job.name);
            job.requeue();
        }

        Self { jobs, queue_file }
    }

    /// Create a queue without persistence.
    pub fn in_memory() -> Self {
        Self {
            jobs: Vec::new(),
            queue_file: PathBuf::new(),
        }
    }

    /// Persist queue to disk (no-op for in-memory queues).
    pub fn save(&self) -> JobResult<()> {
        if self.queue_file.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.queue_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let state = QueueState {
            version: 1,
            jobs: self.jobs.clone(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        // Write atomically via temp file
        let temp_file = self.queue_file.with_extension("json.tmp");
        fs::write(&temp_file, &json)?;
        fs::rename(&temp_file, &self.queue_file)?;

        tracing::debug!("Saved {} jobs to queue.json", self.jobs.len());
        Ok(())
    }

    /// Save, logging instead of failing.
    pub fn save_or_warn(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("Could not persist queue: {}", e);
        }
    }

    pub fn jobs(&self) -> &[ConversionJob] {
        &self.jobs
    }

    pub fn get(&self, index: usize) -> Option<&ConversionJob> {
        self.jobs.get(index)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ConversionJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut ConversionJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Append a job.
    pub fn add(&mut self, job: ConversionJob) {
        self.jobs.push(job);
    }

    /// Remove a job by index.
    pub fn remove(&mut self, index: usize) -> Option<ConversionJob> {
        if index < self.jobs.len() {
            Some(self.jobs.remove(index))
        } else {
            None
        }
    }

    /// Remove a job by ID.
    pub fn remove_by_id(&mut self, id: &str) -> Option<ConversionJob> {
        let index = self.jobs.iter().position(|j| j.id == id)?;
        Some(self.jobs.remove(index))
    }

    /// Move a job from one position to another.
    pub fn move_job(&mut self, from: usize, to: usize) {
        if from < self.jobs.len() && to < self.jobs.len() && from != to {
            let job = self.jobs.remove(from);
            self.jobs.insert(to, job);
        }
    }

    /// IDs of jobs still waiting, in queue order.
    pub fn pending(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .map(|j| j.id.clone())
            .collect()
    }

    /// Drop every job that reached a terminal state. Returns how many were removed.
    pub fn clear_finished(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|j| !j.status.is_finished());
        before - self.jobs.len()
    }

    /// Remove all jobs.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}
