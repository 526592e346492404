//! Filename sanitization and destination naming for downloads.

/// Filters a display name down to filesystem-safe characters.
///
/// Allowed characters are ASCII letters, digits and `-_.() ` (space
/// included); everything else is dropped, not replaced.
#[must_use]
pub fn sanitize_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')' | ' '))
        .collect()
}

/// Builds the destination file name for one podcast.
///
/// The index is 1-based and descends from the course's podcast count in
/// listing order, so the newest (first-listed) item carries the highest
/// number and files sort chronologically on disk.
#[must_use]
pub fn destination_file_name(index: usize, name: &str) -> String {
    format!("{index:02} - {}.mp4", sanitize_name(name))
}
