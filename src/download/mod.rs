//! Concurrent download engine: bounded worker pool and transfer executors.
//!
//! # Features
//!
//! - Streaming transfers written through a temporary `.partial` path and
//!   renamed atomically on success
//! - Semaphore-bounded concurrency with a non-blocking completion probe
//! - Per-record failure capture: one bad transfer never aborts the pool
//! - Filename sanitization and indexed destination naming

mod engine;
mod filename;
mod transfer;

pub use engine::{DEFAULT_CONCURRENCY, DownloadEngine, EngineError, PoolMonitor, PoolRun};
pub use filename::{destination_file_name, sanitize_name};
