//! End-of-run summary of download outcomes.

use crate::queue::Retired;

/// Renders the final report: a success tally and, when any transfers
/// failed, one bullet per error. Every errored record appears exactly once.
#[must_use]
pub fn render_report(retired: &Retired) -> String {
    let mut out = String::new();

    let downloads = if retired.completed.len() == 1 {
        "download"
    } else {
        "downloads"
    };
    out.push_str(&format!(
        "{} {downloads} completed successfully\n",
        retired.completed.len()
    ));

    if retired.errored.is_empty() {
        out.push_str("No errors occurred\n");
    } else {
        let errors = if retired.errored.len() == 1 {
            "error"
        } else {
            "errors"
        };
        out.push_str(&format!("{} {errors} occurred:\n", retired.errored.len()));
        for record in &retired.errored {
            out.push_str(&format!(
                "- {}: {}\n",
                record.name(),
                record.error_message().unwrap_or_default()
            ));
        }
    }

    out
}

/// Prints the final report to stdout.
pub fn print_report(retired: &Retired) {
    print!("{}", render_report(retired));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::Podcast;
    use crate::queue::DownloadRecord;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn completed(name: &str) -> Arc<DownloadRecord> {
        let record = DownloadRecord::new(
            Podcast::new(name, "/podcast/x"),
            PathBuf::from(format!("/tmp/{name}.mp4")),
        );
        record.mark_starting();
        record.mark_downloading(1);
        record.add_progress(1);
        record.mark_complete();
        Arc::new(record)
    }

    fn errored(name: &str, message: &str) -> Arc<DownloadRecord> {
        let record = DownloadRecord::new(
            Podcast::new(name, "/podcast/x"),
            PathBuf::from(format!("/tmp/{name}.mp4")),
        );
        record.mark_starting();
        record.mark_error(message);
        Arc::new(record)
    }

    #[test]
    fn test_report_all_successful() {
        let retired = Retired {
            completed: vec![completed("P1"), completed("P2")],
            errored: Vec::new(),
        };
        assert_eq!(
            render_report(&retired),
            "2 downloads completed successfully\nNo errors occurred\n"
        );
    }

    #[test]
    fn test_report_singular_download() {
        let retired = Retired {
            completed: vec![completed("P1")],
            errored: Vec::new(),
        };
        assert!(render_report(&retired).starts_with("1 download completed successfully"));
    }

    #[test]
    fn test_report_lists_each_error_once() {
        let retired = Retired {
            completed: vec![completed("P1")],
            errored: vec![errored("P2", "could not get podcast for P2 - timed out")],
        };
        let report = render_report(&retired);
        assert!(report.contains("1 error occurred:"), "got: {report}");
        assert_eq!(
            report
                .matches("- P2: could not get podcast for P2 - timed out")
                .count(),
            1
        );
    }

    #[test]
    fn test_report_plural_errors() {
        let retired = Retired {
            completed: Vec::new(),
            errored: vec![errored("P1", "a"), errored("P2", "b")],
        };
        let report = render_report(&retired);
        assert!(report.contains("0 downloads completed successfully"));
        assert!(report.contains("2 errors occurred:"));
        assert!(report.contains("- P1: a\n"));
        assert!(report.contains("- P2: b\n"));
    }
}
