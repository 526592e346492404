//! Pure frame composition for the live download view.
//!
//! Everything here is deterministic string layout; the renderer decides when
//! to paint and how much to erase.

use crate::queue::{DownloadStatus, RecordSnapshot};

/// Screen columns reserved per line for the status label, bar brackets and
/// byte counts; whatever is left goes to the podcast name.
const LINE_OVERHEAD: usize = 35;

/// One composed repaint.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame {
    /// The full frame text. Record lines end in `\n`; the hidden-items
    /// footer, when present, does not.
    pub text: String,
    /// Number of record lines, used to reposition the cursor on the next
    /// repaint.
    pub line_count: usize,
}

/// Formats a byte count as whole megabytes.
#[must_use]
pub fn format_size(size_in_bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let megabytes = (size_in_bytes as f64 / 1_000_000.0).round() as u64;
    format!("{megabytes} MB")
}

/// Composes one frame from the live snapshots.
///
/// Names are truncated with an ellipsis to fit the available width; at most
/// `height - 1` records are shown, with a `[<k> downloads hidden]` footer
/// when the rest do not fit.
#[must_use]
pub fn compose_frame(
    snapshots: &[RecordSnapshot],
    width: usize,
    height: usize,
    bar_width: usize,
) -> Frame {
    let max_name_length = width.saturating_sub(bar_width + LINE_OVERHEAD);

    let mut shown = snapshots.len();
    let display_height = height.saturating_sub(1);
    let truncated = shown > display_height;
    if truncated {
        shown = display_height;
    }

    let mut text = String::new();
    for snapshot in &snapshots[..shown] {
        push_line(&mut text, snapshot, max_name_length, bar_width);
    }

    if truncated {
        text.push_str(&format!("[{} downloads hidden]", snapshots.len() - shown));
    }

    Frame {
        text,
        line_count: shown,
    }
}

fn push_line(
    text: &mut String,
    snapshot: &RecordSnapshot,
    max_name_length: usize,
    bar_width: usize,
) {
    let name_length = snapshot.name.chars().count();
    if name_length > max_name_length {
        text.extend(snapshot.name.chars().take(max_name_length));
        text.push_str("...");
    } else {
        text.push_str(&snapshot.name);
    }

    if snapshot.status == DownloadStatus::Downloading {
        let filled = bar_cells(snapshot.progress, snapshot.total_size, bar_width);
        text.push_str(": Downloading [");
        text.extend(std::iter::repeat_n('\u{2588}', filled));
        text.extend(std::iter::repeat_n(' ', bar_width - filled));
        text.push_str("] ");
        text.push_str(&format!("{:>6}", format_size(snapshot.progress)));
        text.push_str(" / ");
        text.push_str(&format_size(snapshot.total_size));
        text.push('\n');
    } else {
        text.push_str(": ");
        text.push_str(snapshot.status.label());
        text.push('\n');
    }
}

/// Number of filled bar cells for the given progress, clamped to the bar.
fn bar_cells(progress: u64, total_size: u64, bar_width: usize) -> usize {
    if total_size == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cells = ((progress as f64 / total_size as f64) * bar_width as f64).round() as usize;
    cells.min(bar_width)
}
