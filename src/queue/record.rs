//! Per-transfer mutable state and its status machine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::provider::Podcast;

/// Status of one download, advancing monotonically from `Waiting` to a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DownloadStatus {
    /// Queued, no executor has picked the record up yet.
    Waiting,
    /// An executor owns the record and is opening the remote stream.
    Starting,
    /// The stream is open and bytes are being written.
    Downloading,
    /// All bytes written and the destination renamed into place.
    Complete,
    /// The transfer failed; the record carries an error message.
    Error,
}

impl DownloadStatus {
    /// Returns the user-facing status label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Starting => "Starting",
            Self::Downloading => "Downloading",
            Self::Complete => "Complete",
            Self::Error => "Error",
        }
    }

    /// Returns true for `Complete` and `Error`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fields that change together under one lock: the status, the error message
/// and the completion instant.
#[derive(Debug)]
struct StatusCell {
    status: DownloadStatus,
    error_message: Option<String>,
    completed_at: Option<Instant>,
}

/// Mutable state for one in-flight transfer.
///
/// Exactly one transfer executor writes a record; the worker pool and the
/// renderer only read it. Byte counters are atomics so single-field reads
/// need no lock; the status/error/completion triple shares a small mutex
/// because those fields flip together.
#[derive(Debug)]
pub struct DownloadRecord {
    podcast: Podcast,
    destination: PathBuf,
    cell: Mutex<StatusCell>,
    progress: AtomicU64,
    total_size: AtomicU64,
}

impl DownloadRecord {
    /// Creates a record in `Waiting` for a podcast and its destination path.
    #[must_use]
    pub fn new(podcast: Podcast, destination: PathBuf) -> Self {
        Self {
            podcast,
            destination,
            cell: Mutex::new(StatusCell {
                status: DownloadStatus::Waiting,
                error_message: None,
                completed_at: None,
            }),
            progress: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
        }
    }

    /// The podcast this record was created for.
    #[must_use]
    pub fn podcast(&self) -> &Podcast {
        &self.podcast
    }

    /// The podcast display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.podcast.name
    }

    /// Final destination path of the download.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// The temporary path written during the transfer.
    #[must_use]
    pub fn partial_path(&self) -> PathBuf {
        let mut partial = self.destination.as_os_str().to_os_string();
        partial.push(".partial");
        PathBuf::from(partial)
    }

    fn cell(&self) -> std::sync::MutexGuard<'_, StatusCell> {
        self.cell
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> DownloadStatus {
        self.cell().status
    }

    /// Bytes written so far.
    #[must_use]
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::SeqCst)
    }

    /// Declared total length, 0 until the stream is open.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::SeqCst)
    }

    /// The error message, set only for `Error` records.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.cell().error_message.clone()
    }

    /// Returns true once the record has sat in a terminal state for at least
    /// `grace`.
    #[must_use]
    pub fn terminal_for(&self, grace: Duration) -> bool {
        self.cell()
            .completed_at
            .is_some_and(|at| at.elapsed() >= grace)
    }

    /// Marks the record as picked up by an executor.
    pub fn mark_starting(&self) {
        let mut cell = self.cell();
        if cell.status == DownloadStatus::Waiting {
            cell.status = DownloadStatus::Starting;
        }
    }

    /// Marks the stream open and records the declared total length.
    pub fn mark_downloading(&self, total_size: u64) {
        let mut cell = self.cell();
        if cell.status == DownloadStatus::Starting {
            self.total_size.store(total_size, Ordering::SeqCst);
            cell.status = DownloadStatus::Downloading;
        }
    }

    /// Adds flushed bytes to the progress counter.
    ///
    /// Progress is clamped so it never exceeds a nonzero declared total,
    /// even if the remote sends more bytes than it announced.
    pub fn add_progress(&self, bytes: u64) {
        let updated = self
            .progress
            .fetch_add(bytes, Ordering::SeqCst)
            .saturating_add(bytes);
        let total = self.total_size.load(Ordering::SeqCst);
        if total > 0 && updated > total {
            self.progress.store(total, Ordering::SeqCst);
        }
    }

    /// Marks the transfer complete. Terminal states are final; repeated
    /// calls keep the first completion instant.
    pub fn mark_complete(&self) {
        let mut cell = self.cell();
        if cell.status.is_terminal() {
            return;
        }
        cell.status = DownloadStatus::Complete;
        cell.completed_at.get_or_insert_with(Instant::now);
    }

    /// Marks the transfer failed with a human-readable message.
    pub fn mark_error(&self, message: impl Into<String>) {
        let mut cell = self.cell();
        if cell.status.is_terminal() {
            return;
        }
        cell.status = DownloadStatus::Error;
        cell.error_message = Some(message.into());
        cell.completed_at.get_or_insert_with(Instant::now);
    }

    /// Takes a read-only snapshot for rendering.
    ///
    /// Fields are read independently; a frame may show progress from just
    /// after a status flip it has not observed yet, which is acceptable
    /// staleness for a display.
    #[must_use]
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            name: self.podcast.name.clone(),
            status: self.status(),
            progress: self.progress(),
            total_size: self.total_size(),
        }
    }
}

/// Read-only view of one record, as consumed by the frame composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot {
    /// Podcast display name.
    pub name: String,
    /// Status at snapshot time.
    pub status: DownloadStatus,
    /// Bytes written at snapshot time.
    pub progress: u64,
    /// Declared total, 0 until known.
    pub total_size: u64,
}
