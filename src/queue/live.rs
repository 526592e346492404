//! The live queue polled by the renderer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::record::{DownloadRecord, RecordSnapshot};

/// Records retired from the live queue, split by terminal outcome.
#[derive(Debug, Default)]
pub struct Retired {
    /// Records that finished successfully.
    pub completed: Vec<Arc<DownloadRecord>>,
    /// Records that terminated with an error.
    pub errored: Vec<Arc<DownloadRecord>>,
}

impl Retired {
    /// Merges another batch of retired records into this one.
    pub fn extend(&mut self, other: Retired) {
        self.completed.extend(other.completed);
        self.errored.extend(other.errored);
    }
}

/// The set of records still shown in the live view.
///
/// The renderer is the only writer (it removes records on retirement); other
/// threads read counts and snapshots. One coarse mutex guards the collection;
/// the records themselves carry their own synchronization.
#[derive(Debug)]
pub struct LiveQueue {
    records: Mutex<Vec<Arc<DownloadRecord>>>,
}

impl LiveQueue {
    /// Creates a live queue over the dispatched records.
    #[must_use]
    pub fn new(records: Vec<Arc<DownloadRecord>>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<DownloadRecord>>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of records still live.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when every record has been retired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshots every live record for frame composition.
    #[must_use]
    pub fn snapshots(&self) -> Vec<RecordSnapshot> {
        self.lock().iter().map(|record| record.snapshot()).collect()
    }

    /// Removes records that have been terminal for at least `grace`.
    pub fn retire_stale(&self, grace: Duration) -> Retired {
        let mut retired = Retired::default();
        self.lock().retain(|record| {
            if record.terminal_for(grace) {
                sort_retired(&mut retired, Arc::clone(record));
                false
            } else {
                true
            }
        });
        retired
    }

    /// Drains all remaining records, retiring terminal ones.
    ///
    /// Non-terminal leftovers are returned separately; with a joined pool
    /// there should be none, and callers report them as unexpected.
    pub fn drain(&self) -> (Retired, Vec<Arc<DownloadRecord>>) {
        let mut retired = Retired::default();
        let mut unexpected = Vec::new();
        for record in self.lock().drain(..) {
            if record.status().is_terminal() {
                sort_retired(&mut retired, record);
            } else {
                unexpected.push(record);
            }
        }
        (retired, unexpected)
    }
}

fn sort_retired(retired: &mut Retired, record: Arc<DownloadRecord>) {
    match record.status() {
        super::DownloadStatus::Error => retired.errored.push(record),
        _ => retired.completed.push(record),
    }
}
