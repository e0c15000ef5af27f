//! Background extraction jobs.
//!
//! Each job extracts one file on its own task and reports back over a
//! channel. The [`JobBoard`] owns the job records and is only mutated by
//! applying those events.

use crate::export::export_text;
use crate::pipeline::{DocumentLoader, ExtractionPipeline};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Lifecycle of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    /// Human-readable status string.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Queued => "Queued",
            Self::Running => "Recognizing...",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    /// Whether the job reached a final state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Notification sent from a running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// The job started working.
    Progress { path: PathBuf, message: String },

    /// The job ended. Sent exactly once; an empty text means failure.
    Finished { path: PathBuf, text: String },

    /// The job failed. Always followed by a `Finished` with empty text.
    Error { path: PathBuf, message: String },
}

impl JobEvent {
    /// File the event belongs to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Progress { path, .. } | Self::Finished { path, .. } | Self::Error { path, .. } => {
                path
            }
        }
    }
}

/// One file's job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub path: PathBuf,
    pub status: JobStatus,
    pub text: String,
}

impl JobRecord {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            status: JobStatus::Pending,
            text: String::new(),
        }
    }

    /// File name for display.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Spawns extraction jobs with a cap on how many run at once.
pub struct JobRunner<L> {
    pipeline: Arc<ExtractionPipeline<L>>,
    permits: Arc<Semaphore>,
}

impl<L> Clone for JobRunner<L> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<L: DocumentLoader + 'static> JobRunner<L> {
    /// Create a runner allowing `max_concurrent` jobs at a time.
    pub fn new(pipeline: Arc<ExtractionPipeline<L>>, max_concurrent: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Start a job for `path`. Must be called within a tokio runtime.
    ///
    /// Exactly one `Finished` event is sent for the job, whatever happens.
    pub fn spawn(&self, path: PathBuf, events: mpsc::UnboundedSender<JobEvent>) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();

            let _ = events.send(JobEvent::Progress {
                path: path.clone(),
                message: JobStatus::Running.label().to_string(),
            });
            log::info!("Extracting {}", path.display());

            let job_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || pipeline.extract(&job_path)).await;

            let text = match outcome {
                Ok(Ok(text)) => {
                    log::info!("Finished {}", path.display());
                    text
                }
                Ok(Err(e)) => {
                    report_failure(&events, &path, &e.to_string());
                    String::new()
                }
                Err(join_error) => {
                    report_failure(&events, &path, &join_error.to_string());
                    String::new()
                }
            };

            let _ = events.send(JobEvent::Finished { path, text });
        })
    }
}

fn report_failure(events: &mpsc::UnboundedSender<JobEvent>, path: &Path, reason: &str) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let message = format!("File {} failed: {}", name, reason);
    log::error!("{}", message);
    let _ = events.send(JobEvent::Error {
        path: path.to_path_buf(),
        message,
    });
}

/// The list of files and their job records.
#[derive(Debug, Default)]
pub struct JobBoard {
    records: Vec<JobRecord>,
}

impl JobBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add files as pending jobs, skipping ones already listed.
    ///
    /// Returns how many were added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if self.index_of(&path).is_none() {
                self.records.push(JobRecord::new(path));
                added += 1;
            }
        }
        added
    }

    /// Remove the records at `indices`. Out of range indices are ignored.
    pub fn remove(&mut self, indices: &[usize]) {
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        for index in indices.into_iter().rev() {
            if index < self.records.len() {
                self.records.remove(index);
            }
        }
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    /// Position of the record for `path`.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.records.iter().position(|r| r.path == path)
    }

    /// Number of jobs that reached a final state.
    pub fn done_count(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_finished()).count()
    }

    /// Whether every job reached a final state.
    pub fn is_finished(&self) -> bool {
        self.done_count() == self.records.len()
    }

    /// Mark every pending job as queued and return their paths.
    pub fn queue_pending(&mut self) -> Vec<PathBuf> {
        self.records
            .iter_mut()
            .filter(|r| r.status == JobStatus::Pending)
            .map(|r| {
                r.status = JobStatus::Queued;
                r.path.clone()
            })
            .collect()
    }

    /// Update the matching record from a job notification.
    pub fn apply(&mut self, event: &JobEvent) {
        let Some(index) = self.index_of(event.path()) else {
            log::debug!("Event for unknown job {}", event.path().display());
            return;
        };
        let record = &mut self.records[index];

        match event {
            JobEvent::Progress { .. } => record.status = JobStatus::Running,
            JobEvent::Finished { text, .. } if text.is_empty() => {
                record.status = JobStatus::Failed;
            }
            JobEvent::Finished { text, .. } => {
                record.status = JobStatus::Done;
                record.text = text.clone();
            }
            JobEvent::Error { .. } => {}
        }
    }

    /// Write the text of the job at `index` to `dest`.
    pub fn export(&self, index: usize, dest: &Path) -> Result<()> {
        let record = self
            .records
            .get(index)
            .ok_or_else(|| Error::NotExportable(format!("no job at position {}", index)))?;

        if record.status != JobStatus::Done {
            return Err(Error::NotExportable(format!(
                "{} has not finished recognition",
                record.display_name()
            )));
        }
        if record.text.trim().is_empty() {
            return Err(Error::NotExportable(format!(
                "{} has no recognized text",
                record.display_name()
            )));
        }

        export_text(dest, &record.text)
    }
}

/// Start every pending job on the board and wait for all of them.
///
/// `on_event` sees each notification after it has been applied.
pub async fn run_pending<L, F>(board: &mut JobBoard, runner: &JobRunner<L>, mut on_event: F)
where
    L: DocumentLoader + 'static,
    F: FnMut(&JobBoard, &JobEvent),
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let queued = board.queue_pending();
    let mut outstanding = queued.len();
    for path in queued {
        runner.spawn(path, tx.clone());
    }
    drop(tx);

    while outstanding > 0 {
        let Some(event) = rx.recv().await else {
            break;
        };
        board.apply(&event);
        if matches!(event, JobEvent::Finished { .. }) {
            outstanding -= 1;
        }
        on_event(board, &event);
    }
}
