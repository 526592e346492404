//! Live progress view for download runs.
//!
//! The renderer is a fixed-interval polling loop, not an event-driven view:
//! every 300 ms it snapshots the live queue, retires records that have sat
//! in a terminal state past the grace period, and repaints the frame in
//! place by erasing exactly the lines it printed last time. Transfers are
//! never blocked by the renderer; they only share the per-record state.

mod frame;

pub use frame::{Frame, compose_frame, format_size};

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use console::Term;
use tokio::task::JoinHandle;

use crate::download::PoolMonitor;
use crate::queue::{LiveQueue, Retired};

/// Repaint cadence of the live view.
pub const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// How long a terminal record stays visible before it is retired into the
/// final report.
pub const RETIRE_GRACE: Duration = Duration::from_secs(3);

/// Terminal geometry fallback when the size cannot be probed (e.g. piped
/// output).
const FALLBACK_SIZE: (u16, u16) = (24, 80);

/// Spawns the live renderer.
///
/// Returns the join handle, which resolves to the retired records for the
/// final report, and a stop flag for shutting the loop down once the pool
/// has been joined.
pub fn spawn_renderer(
    queue: Arc<LiveQueue>,
    monitor: PoolMonitor,
    bar_width: usize,
) -> (JoinHandle<Retired>, Arc<AtomicBool>) {
    let stop = Arc::new(AtomicBool::new(false));
    let handle = tokio::spawn(render_loop(queue, monitor, bar_width, Arc::clone(&stop)));
    (handle, stop)
}

async fn render_loop(
    queue: Arc<LiveQueue>,
    monitor: PoolMonitor,
    bar_width: usize,
    stop: Arc<AtomicBool>,
) -> Retired {
    let term = Term::stdout();
    let mut retired = Retired::default();
    let mut last_lines = 0usize;

    while !(stop.load(Ordering::SeqCst) || monitor.all_terminal()) {
        retired.extend(queue.retire_stale(RETIRE_GRACE));

        let (rows, cols) = term.size_checked().unwrap_or(FALLBACK_SIZE);
        let frame = compose_frame(
            &queue.snapshots(),
            usize::from(cols),
            usize::from(rows),
            bar_width,
        );

        erase_previous(last_lines);
        print!("{}", frame.text);
        flush_stdout();
        last_lines = frame.line_count;

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    // Clear the last frame; the report takes over stdout from here.
    erase_previous(last_lines);
    flush_stdout();

    let (rest, unexpected) = queue.drain();
    for record in unexpected {
        println!(
            "Unexpected status [{}] for podcast {}",
            record.status(),
            record.name()
        );
    }
    retired.extend(rest);
    retired
}

/// Moves the cursor back over the previous frame and clears to the end of
/// the screen, so the repaint never scrolls the terminal.
fn erase_previous(line_count: usize) {
    if line_count > 0 {
        print!("\x1b[{line_count}F\x1b[0J");
    } else {
        // Nothing above the cursor; just clear from the line start (covers a
        // footer-only frame).
        print!("\r\x1b[0J");
    }
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}
