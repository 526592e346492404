//! Discovery phase: walk the catalog and build the fixed download queue.
//!
//! One pass over courses and podcasts, newest podcast first within a course.
//! Excluded courses produce no directory and no records; podcasts whose
//! final destination already exists are skipped without re-verification.
//! Per-course listing failures are printed and skipped; only the course-list
//! fetch itself is fatal.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::download::{destination_file_name, sanitize_name};
use crate::provider::{CatalogProvider, ProviderError};
use crate::queue::DownloadRecord;

/// Returns true when the exclude pattern matches at the start of the course
/// name (the filter is a prefix match, case-sensitive).
#[must_use]
pub fn course_excluded(exclude: Option<&Regex>, name: &str) -> bool {
    exclude.is_some_and(|pattern| pattern.find(name).is_some_and(|m| m.start() == 0))
}

/// Walks the catalog and returns the records still to be downloaded.
///
/// Prints one line per skipped course or podcast as it goes; the queue it
/// returns is fixed, ready for dispatch.
///
/// # Errors
///
/// Returns [`ProviderError`] only if the course list itself cannot be
/// fetched; every later failure is downgraded to a printed skip.
pub async fn discover(
    provider: &dyn CatalogProvider,
    base_dir: &Path,
    exclude: Option<&Regex>,
) -> Result<Vec<Arc<DownloadRecord>>, ProviderError> {
    let courses = provider.list_courses().await?;
    let mut queue: Vec<Arc<DownloadRecord>> = Vec::new();

    for course in &courses {
        if course_excluded(exclude, &course.name) {
            println!("{}", "-".repeat(9 + course.name.chars().count()));
            println!("Ignoring {}", course.name);
            continue;
        }

        let banner = "-".repeat(21 + course.name.chars().count());
        println!("{banner}");
        println!("Getting podcasts for {}", course.name);
        println!("{banner}");

        let podcasts = match provider.list_podcasts(course).await {
            Ok(podcasts) => podcasts,
            Err(err) => {
                // One bad course never stops the walk.
                println!("{err}");
                continue;
            }
        };

        let course_dir = base_dir.join(sanitize_name(&course.name));
        if let Err(err) = tokio::fs::create_dir_all(&course_dir).await {
            println!(
                "Could not create directory {} - {err}",
                course_dir.display()
            );
            continue;
        }

        let mut index = podcasts.len() + 1;
        for podcast in podcasts {
            index -= 1;

            let destination = course_dir.join(destination_file_name(index, &podcast.name));
            if destination.is_file() {
                println!("Skipping podcast {} (already exists)", podcast.name);
                continue;
            }

            println!("Queuing podcast {}", podcast.name);
            debug!(podcast = %podcast.name, destination = %destination.display(), "queued");
            queue.push(Arc::new(DownloadRecord::new(podcast, destination)));
        }
    }

    Ok(queue)
}
