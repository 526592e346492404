//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Batch download university lecture podcasts with live progress.
///
/// Podhoard logs into the video portal, discovers the courses and podcasts
/// available to the account, and downloads everything not already on disk.
#[derive(Parser, Debug)]
#[command(name = "podhoard")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the settings file (default: ~/.podhoard.toml)
    pub settings: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error logs
    #[arg(short, long)]
    pub quiet: bool,
}
