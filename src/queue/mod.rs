//! Download queue state: per-transfer records and the live view collection.
//!
//! - [`DownloadRecord`] - mutable state for one in-flight transfer
//! - [`DownloadStatus`] - the closed status machine
//! - [`RecordSnapshot`] - read-only view consumed by the frame composer
//! - [`LiveQueue`] - the mutex-guarded collection the renderer polls and trims

mod live;
mod record;

pub use live::{LiveQueue, Retired};
pub use record::{DownloadRecord, DownloadStatus, RecordSnapshot};
