//! Worker pool for concurrent podcast transfers.
//!
//! The engine takes the full queue up front and runs one transfer executor
//! per record, with a semaphore bounding how many hold a permit at once.
//! There is no retry: each record is driven to a terminal state exactly once.
//!
//! # Concurrency Model
//!
//! - Each transfer runs in its own Tokio task
//! - A semaphore permit is acquired before the record leaves `Waiting`, so
//!   at most N records are ever in `Starting`/`Downloading`
//! - Permits are released automatically when transfers finish (RAII)
//! - A shared remaining-counter answers "all terminal?" without blocking

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::transfer;
use crate::provider::CatalogProvider;
use crate::queue::DownloadRecord;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Error type for worker pool construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Worker pool dispatching transfer executors under a concurrency limit.
#[derive(Debug)]
pub struct DownloadEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl DownloadEngine {
    /// Creates a pool with the given concurrency limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        debug!(concurrency, "creating download engine");
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Spawns a transfer executor for every record and returns the running
    /// pool.
    ///
    /// The queue is fixed at this point; no records are accepted afterwards.
    /// Individual transfer failures never surface here - they are captured
    /// in the records themselves.
    #[must_use]
    pub fn dispatch(
        &self,
        records: &[Arc<DownloadRecord>],
        provider: Arc<dyn CatalogProvider>,
    ) -> PoolRun {
        let remaining = Arc::new(AtomicUsize::new(records.len()));
        info!(queued = records.len(), "dispatching transfers");

        let handles = records
            .iter()
            .map(|record| {
                let semaphore = Arc::clone(&self.semaphore);
                let provider = Arc::clone(&provider);
                let record = Arc::clone(record);
                let remaining = Arc::clone(&remaining);

                tokio::spawn(async move {
                    match semaphore.acquire_owned().await {
                        Ok(_permit) => {
                            // Permit held for the whole transfer (RAII).
                            transfer::run(&record, provider.as_ref()).await;
                        }
                        Err(_) => {
                            record.mark_error("worker pool closed before the transfer started");
                        }
                    }
                    remaining.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        PoolRun { handles, remaining }
    }
}

/// A dispatched batch of transfer executors.
#[derive(Debug)]
pub struct PoolRun {
    handles: Vec<JoinHandle<()>>,
    remaining: Arc<AtomicUsize>,
}

impl PoolRun {
    /// Returns a cheap handle for polling completion from another task.
    #[must_use]
    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            remaining: Arc::clone(&self.remaining),
        }
    }

    /// Returns true once every executor has reached a terminal state.
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.remaining.load(Ordering::SeqCst) == 0
    }

    /// Waits for every executor task to finish.
    ///
    /// Task panics are logged, not propagated, so one bad transfer never
    /// aborts the pool.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "transfer task panicked");
            }
        }
    }
}

/// Non-blocking completion probe shared with the renderer.
#[derive(Debug, Clone)]
pub struct PoolMonitor {
    remaining: Arc<AtomicUsize>,
}

impl PoolMonitor {
    /// Returns true once every executor has reached a terminal state.
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.remaining.load(Ordering::SeqCst) == 0
    }
}
