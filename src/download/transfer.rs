//! Transfer executor: drives one download record to a terminal state.

use std::path::PathBuf;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::provider::{CatalogProvider, ChunkStream, ProviderError};
use crate::queue::DownloadRecord;

/// Failures inside one transfer. Never escapes [`run`]; the display string
/// becomes the record's error message.
#[derive(Debug, thiserror::Error)]
enum TransferError {
    /// The provider stream failed mid-body.
    #[error(transparent)]
    Stream(#[from] ProviderError),

    /// File system failure while writing or renaming.
    #[error("could not write {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Runs one transfer to completion, capturing every failure into the record.
///
/// Step order: mark `Starting`; open the remote stream; mark `Downloading`
/// with the declared length; stream chunks into `<destination>.partial`;
/// rename into place; mark `Complete`. Errors at any step mark the record
/// `Error` instead - nothing propagates past this boundary, so one bad
/// transfer never aborts the pool.
pub(crate) async fn run(record: &DownloadRecord, provider: &dyn CatalogProvider) {
    record.mark_starting();
    debug!(podcast = record.name(), "transfer starting");

    let stream = match provider.open_download(record.podcast()).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(podcast = record.name(), error = %err, "could not open download");
            record.mark_error(err.to_string());
            return;
        }
    };

    record.mark_downloading(stream.total_size);

    match write_stream(record, stream.chunks).await {
        Ok(bytes) => {
            info!(
                podcast = record.name(),
                bytes,
                path = %record.destination().display(),
                "transfer complete"
            );
            record.mark_complete();
        }
        Err(err) => {
            warn!(podcast = record.name(), error = %err, "transfer failed");
            record.mark_error(err.to_string());
        }
    }
}

/// Streams the body into the partial file and renames it on success.
///
/// On failure the partial file is left on disk; cleanup is a user concern,
/// and the final-named destination is never created.
async fn write_stream(record: &DownloadRecord, mut chunks: ChunkStream) -> Result<u64, TransferError> {
    let partial = record.partial_path();
    let file = File::create(&partial)
        .await
        .map_err(|err| TransferError::io(&partial, err))?;
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|err| TransferError::io(&partial, err))?;
        bytes_written += chunk.len() as u64;
        record.add_progress(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|err| TransferError::io(&partial, err))?;

    tokio::fs::rename(&partial, record.destination())
        .await
        .map_err(|err| TransferError::io(record.destination(), err))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::{Course, DownloadStream, Podcast};
    use crate::queue::DownloadStatus;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream;

    /// Per-test provider stub with a scripted `open_download` outcome.
    enum Scripted {
        Body(Vec<u8>),
        OpenFails,
        MidStreamFails,
    }

    #[async_trait]
    impl CatalogProvider for Scripted {
        async fn login(&self, _username: &str, _password: &str) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn list_courses(&self) -> Result<Vec<Course>, ProviderError> {
            Ok(Vec::new())
        }

        async fn list_podcasts(&self, _course: &Course) -> Result<Vec<Podcast>, ProviderError> {
            Ok(Vec::new())
        }

        async fn open_download(&self, podcast: &Podcast) -> Result<DownloadStream, ProviderError> {
            match self {
                Self::Body(body) => Ok(DownloadStream {
                    total_size: body.len() as u64,
                    chunks: Box::pin(stream::iter(vec![Ok(Bytes::copy_from_slice(body))])),
                }),
                Self::OpenFails => Err(ProviderError::status(
                    format!("get podcast for {}", podcast.name),
                    503,
                )),
                Self::MidStreamFails => Ok(DownloadStream {
                    total_size: 8,
                    chunks: Box::pin(stream::iter(vec![
                        Ok(Bytes::from_static(b"1234")),
                        Err(ProviderError::malformed(
                            format!("get podcast for {}", podcast.name),
                            "connection reset",
                        )),
                    ])),
                }),
            }
        }
    }

    fn record_in(dir: &tempfile::TempDir) -> DownloadRecord {
        DownloadRecord::new(
            Podcast::new("Week 1", "/podcast/1"),
            dir.path().join("01 - Week 1.mp4"),
        )
    }

    #[tokio::test]
    async fn test_successful_transfer_renames_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = record_in(&dir);

        run(&record, &Scripted::Body(b"media bytes".to_vec())).await;

        assert_eq!(record.status(), DownloadStatus::Complete);
        assert_eq!(record.progress(), 11);
        assert_eq!(record.total_size(), 11);
        assert!(record.destination().exists());
        assert!(!record.partial_path().exists(), "partial must be renamed");
        assert_eq!(std::fs::read(record.destination()).unwrap(), b"media bytes");
    }

    #[tokio::test]
    async fn test_open_failure_marks_error_without_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = record_in(&dir);

        run(&record, &Scripted::OpenFails).await;

        assert_eq!(record.status(), DownloadStatus::Error);
        let message = record.error_message().unwrap();
        assert!(message.contains("503"), "got: {message}");
        assert!(!record.destination().exists());
        assert!(!record.partial_path().exists());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_leaves_partial_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = record_in(&dir);

        run(&record, &Scripted::MidStreamFails).await;

        assert_eq!(record.status(), DownloadStatus::Error);
        assert!(record.error_message().unwrap().contains("connection reset"));
        assert!(
            !record.destination().exists(),
            "errored transfer must never produce a final-named file"
        );
        assert!(record.partial_path().exists(), "partial stays on disk");
        assert_eq!(record.progress(), 4);
    }

    #[tokio::test]
    async fn test_write_failure_marks_error() {
        let dir = tempfile::TempDir::new().unwrap();
        // Destination inside a directory that does not exist.
        let record = DownloadRecord::new(
            Podcast::new("Week 1", "/podcast/1"),
            dir.path().join("missing-course-dir").join("01 - Week 1.mp4"),
        );

        run(&record, &Scripted::Body(b"media".to_vec())).await;

        assert_eq!(record.status(), DownloadStatus::Error);
        assert!(record.error_message().unwrap().contains("could not write"));
    }
}
